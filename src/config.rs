//! Clip pools described in YAML
//!
//! ```yaml
//! steps_per_sec: 24.0
//! samples: [0, 12, 24]
//! keyframes: [[0, 1], [1, 2]]
//! clips:
//!   - name: walk
//!     first_keyframe: 0
//!     final_keyframe: 1
//!     forward:
//!       flag: PLAY | OVERSTEP
//! ```
use crate::{
    arm_error::ArmError,
    keyframe::{ClipPool, Terminus, TransitionFlag},
};
use ahash::{HashMap, HashMapExt};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Transition at one end of a clip. The target clip is given by name and
/// defaults to the clip itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionDesc {
    pub flag: TransitionFlag,
    pub offset: i32,
    pub clip: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipDesc {
    pub name: String,
    pub first_keyframe: usize,
    pub final_keyframe: usize,
    #[serde(default)]
    pub forward: Option<TransitionDesc>,
    #[serde(default)]
    pub reverse: Option<TransitionDesc>,
}

/// A whole clip pool. Samples are time steps, keyframes are pairs of sample
/// indices and clips are ranges of keyframe indices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipPoolDesc {
    pub steps_per_sec: f64,
    pub samples: Vec<i32>,
    pub keyframes: Vec<[usize; 2]>,
    pub clips: Vec<ClipDesc>,
}

impl ClipPoolDesc {
    /// # Errors
    /// Returns `ArmError::SerdeYamlError` if the text does not parse
    pub fn from_yaml_str(text: &str) -> Result<Self, ArmError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// # Errors
    /// Returns an error if the file can't be read or does not parse
    pub fn load(path: &Path) -> Result<Self, ArmError> {
        info!("Loading clip pool description {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// # Errors
    /// Returns `ArmError::SerdeYamlError` if serialization fails
    pub fn to_yaml_string(&self) -> Result<String, ArmError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Creates and initializes the described pool, including clip durations
    /// and transitions
    ///
    /// # Errors
    /// Returns an error if any count is zero, any index is out of range, the
    /// step rate is not positive or a transition names an unknown clip
    pub fn build(&self) -> Result<ClipPool, ArmError> {
        let sps = self.steps_per_sec;
        let mut pool = ClipPool::new(
            self.clips.len(),
            self.keyframes.len(),
            self.samples.len(),
        )?;
        for (i, time_step) in self.samples.iter().enumerate() {
            pool.init_sample(i, *time_step, sps)?;
        }
        for (i, [s0, s1]) in self.keyframes.iter().enumerate() {
            pool.init_keyframe(i, *s0, *s1, sps)?;
        }

        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (i, clip) in self.clips.iter().enumerate() {
            pool.init_clip(i, &clip.name, clip.first_keyframe, clip.final_keyframe)?;
            pool.calculate_duration(i, sps)?;
            // Keyed on the stored name, which fills in empty names
            if let Some(stored) = pool.clip(i) {
                by_name.entry(stored.name.clone()).or_insert(i);
            }
        }

        for (i, clip) in self.clips.iter().enumerate() {
            for (terminus, desc) in [
                (Terminus::Forward, &clip.forward),
                (Terminus::Reverse, &clip.reverse),
            ] {
                let Some(desc) = desc else {
                    continue;
                };
                let target = match &desc.clip {
                    Some(name) => *by_name
                        .get(name.as_str())
                        .ok_or_else(|| ArmError::UnknownClip(name.clone()))?,
                    None => i,
                };
                pool.init_transition(i, terminus, desc.flag, desc.offset, target)?;
            }
        }
        debug!("Built clip pool with {} clips", self.clips.len());
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_flag_text() {
        let desc: TransitionDesc =
            serde_yaml::from_str("flag: PLAY | OVERSTEP\nclip: run\n").unwrap();
        assert_eq!(desc.flag, TransitionFlag::PLAY | TransitionFlag::OVERSTEP);
        assert_eq!(desc.offset, 0);
        assert_eq!(desc.clip.as_deref(), Some("run"));
    }
}
