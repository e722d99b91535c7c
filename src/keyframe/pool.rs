use super::types::{Clip, ClipTransition, Keyframe, Sample, Terminus, TransitionFlag};
use crate::arm_error::ArmError;
use log::debug;

const UNNAMED_CLIP: &str = "unnamed clip";

fn check_rate(steps_per_sec: f64) -> Result<(), ArmError> {
    if steps_per_sec > 0.0 && steps_per_sec.is_finite() {
        Ok(())
    } else {
        Err(ArmError::InvalidRate)
    }
}

/// Flat storage for clips, keyframes and samples
///
/// Everything refers to everything else by index, so a pool can be copied or
/// stored without fixing up references. Elements are numbered with their
/// position when the pool is created. Many controllers can read one pool.
#[derive(Clone, Debug, Default)]
pub struct ClipPool {
    clips: Vec<Clip>,
    keyframes: Vec<Keyframe>,
    samples: Vec<Sample>,
}

impl ClipPool {
    /// Creates an initialized pool
    ///
    /// # Errors
    /// See `create`
    pub fn new(
        clip_count: usize,
        keyframe_count: usize,
        sample_count: usize,
    ) -> Result<Self, ArmError> {
        let mut pool = Self::default();
        pool.create(clip_count, keyframe_count, sample_count)?;
        Ok(pool)
    }

    /// Allocates the three arrays and numbers every element. Returns the clip
    /// count.
    ///
    /// # Errors
    /// Returns `ArmError::AlreadyInitialized` if the pool already has clips or
    /// `ArmError::InvalidCount` if any count is zero
    pub fn create(
        &mut self,
        clip_count: usize,
        keyframe_count: usize,
        sample_count: usize,
    ) -> Result<usize, ArmError> {
        if self.is_initialized() {
            return Err(ArmError::AlreadyInitialized);
        }
        for count in [clip_count, keyframe_count, sample_count] {
            if count == 0 {
                return Err(ArmError::InvalidCount(count));
            }
        }
        self.clips = (0..clip_count)
            .map(|index| Clip {
                index,
                keyframe_count: 1,
                ..Clip::default()
            })
            .collect();
        self.keyframes = (0..keyframe_count)
            .map(|index| Keyframe {
                index,
                ..Keyframe::default()
            })
            .collect();
        self.samples = (0..sample_count)
            .map(|index| Sample {
                index,
                ..Sample::default()
            })
            .collect();
        debug!(
            "Created clip pool with {clip_count} clips, {keyframe_count} \
            keyframes and {sample_count} samples"
        );
        Ok(clip_count)
    }

    /// # Errors
    /// Returns `ArmError::NotInitialized` if there was nothing to release
    pub fn release(&mut self) -> Result<usize, ArmError> {
        if !self.is_initialized() {
            return Err(ArmError::NotInitialized);
        }
        let clip_count = self.clips.len();
        *self = Self::default();
        Ok(clip_count)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !self.clips.is_empty()
    }

    #[must_use]
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    #[must_use]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[must_use]
    pub fn clip(&self, index: usize) -> Option<&Clip> {
        self.clips.get(index)
    }

    #[must_use]
    pub fn keyframe(&self, index: usize) -> Option<&Keyframe> {
        self.keyframes.get(index)
    }

    #[must_use]
    pub fn sample(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// Index of the first clip with the given name
    #[must_use]
    pub fn clip_index(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.name == name)
    }

    /// Places a sample at `time_step` on a timeline running at
    /// `steps_per_sec`
    ///
    /// # Errors
    /// Returns an error for an unknown sample or a non-positive rate
    pub fn init_sample(
        &mut self,
        sample_index: usize,
        time_step: i32,
        steps_per_sec: f64,
    ) -> Result<usize, ArmError> {
        check_rate(steps_per_sec)?;
        let sample = self
            .samples
            .get_mut(sample_index)
            .ok_or(ArmError::IndexOutOfRange(sample_index))?;
        sample.time_step = time_step;
        sample.time_sec = f64::from(time_step) / steps_per_sec;
        Ok(sample_index)
    }

    /// Spans a keyframe between two samples. Samples out of order give a
    /// negative duration, which is allowed.
    ///
    /// # Errors
    /// Returns an error for an unknown keyframe or sample, a non-positive
    /// rate or a duration that does not fit in an `i32`
    pub fn init_keyframe(
        &mut self,
        keyframe_index: usize,
        sample_index0: usize,
        sample_index1: usize,
        steps_per_sec: f64,
    ) -> Result<usize, ArmError> {
        check_rate(steps_per_sec)?;
        let step0 = self
            .sample(sample_index0)
            .ok_or(ArmError::IndexOutOfRange(sample_index0))?
            .time_step;
        let step1 = self
            .sample(sample_index1)
            .ok_or(ArmError::IndexOutOfRange(sample_index1))?
            .time_step;
        let keyframe = self
            .keyframes
            .get_mut(keyframe_index)
            .ok_or(ArmError::IndexOutOfRange(keyframe_index))?;
        let duration_step = step1
            .checked_sub(step0)
            .ok_or(ArmError::StepOverflow(keyframe_index))?;
        keyframe.sample_index0 = sample_index0;
        keyframe.sample_index1 = sample_index1;
        keyframe.duration_step = duration_step;
        keyframe.duration_sec = f64::from(keyframe.duration_step) / steps_per_sec;
        keyframe.duration_inv = 1.0 / keyframe.duration_sec;
        Ok(keyframe_index)
    }

    /// Names a clip and sets its keyframe range. The range may run backwards.
    /// Both transitions are reset to stop at the clip itself.
    ///
    /// # Errors
    /// Returns an error for an unknown clip or keyframe
    pub fn init_clip(
        &mut self,
        clip_index: usize,
        name: &str,
        keyframe_index_first: usize,
        keyframe_index_final: usize,
    ) -> Result<usize, ArmError> {
        for index in [keyframe_index_first, keyframe_index_final] {
            if index >= self.keyframes.len() {
                return Err(ArmError::IndexOutOfRange(index));
            }
        }
        let clip = self
            .clips
            .get_mut(clip_index)
            .ok_or(ArmError::IndexOutOfRange(clip_index))?;
        clip.name = if name.is_empty() {
            UNNAMED_CLIP.to_owned()
        } else {
            name.to_owned()
        };
        clip.keyframe_index_first = keyframe_index_first;
        clip.keyframe_index_final = keyframe_index_final;
        clip.keyframe_count =
            1 + keyframe_index_first.abs_diff(keyframe_index_final);
        clip.keyframe_direction = match keyframe_index_final.cmp(&keyframe_index_first) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
        };
        let stop = ClipTransition {
            flag: TransitionFlag::empty(),
            offset: 0,
            clip_index,
        };
        clip.transition_forward = stop;
        clip.transition_reverse = stop;
        Ok(clip_index)
    }

    /// Sets what happens when playback of a clip crosses one of its ends
    ///
    /// # Errors
    /// Returns an error if either clip is unknown
    pub fn init_transition(
        &mut self,
        clip_index: usize,
        terminus: Terminus,
        flag: TransitionFlag,
        offset: i32,
        target_clip_index: usize,
    ) -> Result<usize, ArmError> {
        if target_clip_index >= self.clips.len() {
            return Err(ArmError::IndexOutOfRange(target_clip_index));
        }
        let clip = self
            .clips
            .get_mut(clip_index)
            .ok_or(ArmError::IndexOutOfRange(clip_index))?;
        let transition = ClipTransition {
            flag,
            offset,
            clip_index: target_clip_index,
        };
        match terminus {
            Terminus::Forward => clip.transition_forward = transition,
            Terminus::Reverse => clip.transition_reverse = transition,
        }
        Ok(clip_index)
    }

    fn checked_clip(&self, clip_index: usize) -> Result<&Clip, ArmError> {
        let clip = self
            .clip(clip_index)
            .ok_or(ArmError::IndexOutOfRange(clip_index))?;
        // A clip that was never initialized may point past the keyframes
        for k in [clip.keyframe_index_first, clip.keyframe_index_final] {
            if k >= self.keyframes.len() {
                return Err(ArmError::IndexOutOfRange(k));
            }
        }
        Ok(clip)
    }

    /// Sums the clip's keyframe durations into the clip duration
    ///
    /// # Errors
    /// Returns an error for an unknown clip, a non-positive rate or a sum
    /// that does not fit in an `i32`
    pub fn calculate_duration(
        &mut self,
        clip_index: usize,
        steps_per_sec: f64,
    ) -> Result<usize, ArmError> {
        check_rate(steps_per_sec)?;
        let clip = self.checked_clip(clip_index)?;
        let duration_step = clip
            .keyframe_indices()
            .try_fold(0_i32, |sum, k| {
                sum.checked_add(self.keyframes[k].duration_step)
            })
            .ok_or(ArmError::StepOverflow(clip_index))?;
        let clip = &mut self.clips[clip_index];
        clip.duration_step = duration_step;
        clip.duration_sec = f64::from(duration_step) / steps_per_sec;
        clip.duration_inv = 1.0 / clip.duration_sec;
        Ok(clip_index)
    }

    /// Respaces the samples of a clip's keyframes evenly over the clip
    /// duration. Each sample is moved to
    /// `sample.index * duration_step / keyframe_count` and the keyframes are
    /// spanned again from the moved samples.
    ///
    /// # Errors
    /// Returns an error for an unknown clip, a non-positive rate or a moved
    /// sample time that does not fit in an `i32`. Nothing is moved then.
    pub fn distribute_duration(
        &mut self,
        clip_index: usize,
        steps_per_sec: f64,
    ) -> Result<usize, ArmError> {
        check_rate(steps_per_sec)?;
        let clip = self.checked_clip(clip_index)?;
        let duration_step = i64::from(clip.duration_step);
        let keyframe_count = clip.keyframe_count as i64;
        let spaced = |s: usize| {
            (s as i64)
                .checked_mul(duration_step)
                .and_then(|t| i32::try_from(t / keyframe_count).ok())
                .ok_or(ArmError::StepOverflow(s))
        };
        let mut spans = Vec::with_capacity(clip.keyframe_count);
        for k in clip.keyframe_indices() {
            let Keyframe {
                sample_index0,
                sample_index1,
                ..
            } = self.keyframes[k];
            let steps = [spaced(sample_index0)?, spaced(sample_index1)?];
            spans.push((k, [sample_index0, sample_index1], steps));
        }
        for (k, [s0, s1], [t0, t1]) in spans {
            self.init_sample(s0, t0, steps_per_sec)?;
            self.init_sample(s1, t1, steps_per_sec)?;
            self.init_keyframe(k, s0, s1, steps_per_sec)?;
        }
        Ok(clip_index)
    }
}
