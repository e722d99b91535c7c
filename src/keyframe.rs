pub mod controller;
pub mod pool;
mod types;

// Re-exports
pub use {
    controller::{
        ClipController, LoopPolicy, TerminusAction, TerminusPolicy,
        TransitionPolicy,
    },
    pool::ClipPool,
    types::{Clip, ClipTransition, Keyframe, Sample, Terminus, TransitionFlag},
};
