use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// One point on an animation timeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub index: usize,
    pub time_step: i32,
    pub time_sec: f64,
}

/// The span between two samples
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub index: usize,
    pub sample_index0: usize,
    pub sample_index1: usize,
    /// Negative if the samples are out of order
    pub duration_step: i32,
    pub duration_sec: f64,
    pub duration_inv: f64,
}

bitflags! {
    /// What happens when playback crosses the end of a clip. The empty set
    /// means stop.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TransitionFlag: u8 {
        /// Keep playing
        const PLAY = 0x01;
        /// Turn playback around
        const REVERSE = 0x02;
        /// Skip the first keyframe entered
        const SKIP = 0x04;
        /// Carry the time past the end into the next keyframe
        const OVERSTEP = 0x08;
        /// Refer to the far end of the target
        const TERMINUS = 0x10;
        /// Enter the target at `ClipTransition::offset` keyframes in
        const OFFSET = 0x20;
        /// Continue with `ClipTransition::clip_index` instead of this clip
        const CLIP = 0x40;
        /// Target is picked at run time
        const BRANCH = 0x80;
    }
}

/// Either end of a clip
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terminus {
    Forward,
    Reverse,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipTransition {
    pub flag: TransitionFlag,
    pub offset: i32,
    pub clip_index: usize,
}

/// Named range of keyframes
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    pub index: usize,
    pub keyframe_index_first: usize,
    pub keyframe_index_final: usize,
    /// Inclusive, so at least 1
    pub keyframe_count: usize,
    /// +1, -1 or 0 for a single keyframe clip
    pub keyframe_direction: i32,
    pub duration_step: i32,
    pub duration_sec: f64,
    pub duration_inv: f64,
    pub transition_forward: ClipTransition,
    pub transition_reverse: ClipTransition,
}

impl Clip {
    /// Pool index of the `n`th keyframe in playback order
    #[must_use]
    pub const fn keyframe_at(&self, n: usize) -> usize {
        if self.keyframe_direction < 0 {
            self.keyframe_index_first - n
        } else {
            self.keyframe_index_first + n
        }
    }

    /// Pool indices of the keyframes in playback order
    pub fn keyframe_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.keyframe_count).map(|n| self.keyframe_at(n))
    }

    /// Pool index of the keyframe after `keyframe_index` in playback order.
    /// Callers must not step past either end.
    #[must_use]
    pub const fn next_keyframe(&self, keyframe_index: usize) -> usize {
        if self.keyframe_direction < 0 {
            keyframe_index - 1
        } else {
            keyframe_index + 1
        }
    }

    #[must_use]
    pub const fn previous_keyframe(&self, keyframe_index: usize) -> usize {
        if self.keyframe_direction < 0 {
            keyframe_index + 1
        } else {
            keyframe_index - 1
        }
    }

    #[must_use]
    pub const fn transition(&self, terminus: Terminus) -> &ClipTransition {
        match terminus {
            Terminus::Forward => &self.transition_forward,
            Terminus::Reverse => &self.transition_reverse,
        }
    }
}
