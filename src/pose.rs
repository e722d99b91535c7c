pub mod group;
pub mod ops;
pub mod state;
mod types;

// Re-exports
pub use {
    group::HierarchyPoseGroup,
    state::{HierarchyState, StateChannel},
    types::HierarchyPose,
};
