use std::{error, fmt};

/// Broad classification of an `ArmError`. Callers that only care about the
/// category of a failure can match on this instead of every variant.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    InvariantViolation,
    AlreadyInitialized,
    NotInitialized,
    Io,
}

/// Unified error type
///
/// Every fallible operation in the crate reports failure through this type
/// before touching its receiver, so a returned error always means nothing was
/// modified.
#[derive(Debug)]
pub enum ArmError {
    InvalidCount(usize),
    IndexOutOfRange(usize),
    InvalidRange { first: usize, count: usize },
    InvalidRate,
    CountMismatch,
    HierarchyMismatch,
    DegenerateKeyframe(usize),
    StepOverflow(usize),
    ParentOrder { index: usize, parent: usize },
    AlreadyInitialized,
    NotInitialized,
    UnknownClip(String),
    InvalidFile,
    FileTooShort,
    StdIoError(std::io::Error),
    SerdeYamlError(Box<serde_yaml::Error>),
}

impl ArmError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCount(_)
            | Self::IndexOutOfRange(_)
            | Self::InvalidRange { .. }
            | Self::InvalidRate
            | Self::CountMismatch
            | Self::HierarchyMismatch
            | Self::DegenerateKeyframe(_)
            | Self::StepOverflow(_)
            | Self::UnknownClip(_) => ErrorKind::InvalidArgument,
            Self::ParentOrder { .. } => ErrorKind::InvariantViolation,
            Self::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::InvalidFile
            | Self::FileTooShort
            | Self::StdIoError(_)
            | Self::SerdeYamlError(_) => ErrorKind::Io,
        }
    }
}

impl error::Error for ArmError {}

impl fmt::Display for ArmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidCount(a) => write!(f, "count {a} is not valid"),
            Self::IndexOutOfRange(a) => write!(f, "index {a} is out of range"),
            Self::InvalidRange { first, count } => {
                write!(f, "node range {first}+{count} is not valid")
            }
            Self::InvalidRate => {
                write!(f, "playback steps per second must be positive")
            }
            Self::CountMismatch => {
                write!(f, "there is a mismatch in the count of poses")
            }
            Self::HierarchyMismatch => {
                write!(f, "inputs reference different hierarchies")
            }
            Self::DegenerateKeyframe(a) => {
                write!(f, "keyframe {a} does not have a positive duration")
            }
            Self::StepOverflow(a) => {
                write!(f, "time steps of element {a} overflow")
            }
            Self::ParentOrder { index, parent } => {
                write!(f, "node {index} can not have parent {parent}")
            }
            Self::AlreadyInitialized => write!(f, "already initialized"),
            Self::NotInitialized => write!(f, "not initialized"),
            Self::UnknownClip(a) => write!(f, "no clip named \"{a}\""),
            Self::InvalidFile => write!(f, "invalid file"),
            Self::FileTooShort => write!(f, "file too short"),
            Self::StdIoError(e) => write!(f, "std::io::Error: {e}"),
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
        }
    }
}

impl From<serde_yaml::Error> for ArmError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<std::io::Error> for ArmError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::FileTooShort
        } else {
            Self::StdIoError(e)
        }
    }
}
