use super::{
    pool::ClipPool,
    types::{Clip, Terminus, TransitionFlag},
};
use crate::arm_error::ArmError;
use log::trace;

const UNNAMED_CONTROLLER: &str = "unnamed clip ctrl";

/// What playback does after crossing one end of a clip
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminusAction {
    /// Wrap to the other end of the same clip, carrying the overstep
    Loop,
    /// Hold at the end that was crossed and zero the playback rate
    Stop,
    /// Turn around at the end that was crossed, carrying the overstep
    PingPong,
    /// Continue in a clip, possibly the same one
    Enter {
        clip_index: usize,
        /// Keyframes to skip from the end entered
        keyframe_offset: usize,
        /// Enter at the final keyframe and play backwards
        reverse: bool,
        /// Carry the time past the terminus into the entered keyframe
        carry_overstep: bool,
    },
}

/// Decides what happens when playback reaches either end of a clip
///
/// Implemented for closures taking the same arguments as `resolve`.
pub trait TerminusPolicy {
    fn resolve(
        &self,
        pool: &ClipPool,
        clip: &Clip,
        terminus: Terminus,
    ) -> TerminusAction;
}

impl<F> TerminusPolicy for F
where
    F: Fn(&ClipPool, &Clip, Terminus) -> TerminusAction,
{
    fn resolve(
        &self,
        pool: &ClipPool,
        clip: &Clip,
        terminus: Terminus,
    ) -> TerminusAction {
        self(pool, clip, terminus)
    }
}

/// Always loops. Used by `ClipController::update`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoopPolicy;

impl TerminusPolicy for LoopPolicy {
    fn resolve(&self, _: &ClipPool, _: &Clip, _: Terminus) -> TerminusAction {
        TerminusAction::Loop
    }
}

/// Follows the transition stored in the clip for the terminus reached
///
/// A transition without `PLAY` stops. `SKIP` and `OFFSET` move the entry
/// point into the target, `CLIP` switches to the transition's target clip
/// and `REVERSE` flips the playback direction. A transition that only plays,
/// possibly reversed, with `OVERSTEP` loops or ping-pongs in place. `TERMINUS`
/// and `BRANCH` are left for callers with their own policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransitionPolicy;

impl TerminusPolicy for TransitionPolicy {
    fn resolve(
        &self,
        _: &ClipPool,
        clip: &Clip,
        terminus: Terminus,
    ) -> TerminusAction {
        let transition = clip.transition(terminus);
        let flag = transition.flag;
        if !flag.contains(TransitionFlag::PLAY) {
            return TerminusAction::Stop;
        }
        let turn = flag.contains(TransitionFlag::REVERSE);
        let mut keyframe_offset = 0;
        if flag.contains(TransitionFlag::SKIP) {
            keyframe_offset += 1;
        }
        if flag.contains(TransitionFlag::OFFSET) {
            keyframe_offset += usize::try_from(transition.offset).unwrap_or(0);
        }
        let carry_overstep = flag.contains(TransitionFlag::OVERSTEP);
        let switch = flag.contains(TransitionFlag::CLIP);
        if !switch && keyframe_offset == 0 && carry_overstep {
            return if turn {
                TerminusAction::PingPong
            } else {
                TerminusAction::Loop
            };
        }
        TerminusAction::Enter {
            clip_index: if switch {
                transition.clip_index
            } else {
                clip.index
            },
            keyframe_offset,
            reverse: turn != (terminus == Terminus::Reverse),
            carry_overstep,
        }
    }
}

// Working copy of the controller's time state while an update is resolved
#[derive(Clone, Copy, Debug)]
struct Cursor {
    clip_index: usize,
    keyframe_index: usize,
    clip_time: f64,
    keyframe_time: f64,
    rate: f64,
}

impl Cursor {
    // Applies a terminus action. Returns false when playback should halt.
    fn apply(
        &mut self,
        pool: &ClipPool,
        clip: &Clip,
        terminus: Terminus,
        overstep: f64,
        action: TerminusAction,
    ) -> Result<bool, ArmError> {
        match (action, terminus) {
            (TerminusAction::Loop, Terminus::Forward) => {
                self.keyframe_index = clip.keyframe_index_first;
                self.keyframe_time = overstep;
                self.clip_time = overstep;
            }
            (TerminusAction::Loop, Terminus::Reverse) => {
                self.keyframe_index = clip.keyframe_index_final;
                self.keyframe_time =
                    overstep + keyframe_duration(pool, self.keyframe_index)?;
                self.clip_time = overstep + clip.duration_sec;
            }
            (TerminusAction::Stop, Terminus::Forward) => {
                self.keyframe_time =
                    keyframe_duration(pool, self.keyframe_index)?;
                self.clip_time = clip.duration_sec;
                self.rate = 0.0;
                return Ok(false);
            }
            (TerminusAction::Stop, Terminus::Reverse) => {
                self.keyframe_time = 0.0;
                self.clip_time = 0.0;
                self.rate = 0.0;
                return Ok(false);
            }
            (TerminusAction::PingPong, Terminus::Forward) => {
                self.keyframe_time =
                    keyframe_duration(pool, self.keyframe_index)? - overstep;
                self.clip_time = clip.duration_sec - overstep;
                self.rate = -self.rate;
            }
            (TerminusAction::PingPong, Terminus::Reverse) => {
                self.keyframe_time = -overstep;
                self.clip_time = -overstep;
                self.rate = -self.rate;
            }
            (
                TerminusAction::Enter {
                    clip_index,
                    keyframe_offset,
                    reverse,
                    carry_overstep,
                },
                _,
            ) => {
                let target = pool
                    .clip(clip_index)
                    .ok_or(ArmError::IndexOutOfRange(clip_index))?;
                let carried = if carry_overstep { overstep.abs() } else { 0.0 };
                let n = keyframe_offset.min(target.keyframe_count - 1);
                let n = if reverse { target.keyframe_count - 1 - n } else { n };
                let mut elapsed = 0.0;
                for k in target.keyframe_indices().take(n) {
                    elapsed += keyframe_duration(pool, k)?;
                }
                self.clip_index = clip_index;
                self.keyframe_index = target.keyframe_at(n);
                if reverse {
                    self.keyframe_time =
                        keyframe_duration(pool, self.keyframe_index)? - carried;
                    self.rate = -self.rate.abs();
                } else {
                    self.keyframe_time = carried;
                    self.rate = self.rate.abs();
                }
                self.clip_time = elapsed + self.keyframe_time;
            }
        }
        Ok(true)
    }
}

fn keyframe_duration(pool: &ClipPool, index: usize) -> Result<f64, ArmError> {
    pool.keyframe(index)
        .map(|keyframe| keyframe.duration_sec)
        .ok_or(ArmError::IndexOutOfRange(index))
}

/// Playback cursor over one clip of a `ClipPool`
///
/// Each update advances clip and keyframe time and produces the normalized
/// parameters used to interpolate between a keyframe's two samples. The
/// controller only stores indices so any number of controllers can read the
/// same pool.
#[derive(Clone, Debug)]
pub struct ClipController {
    name: String,
    clip_index: usize,
    keyframe_index: usize,
    clip_time_step: i32,
    keyframe_time_step: i32,
    playback_step: i32,
    clip_time_sec: f64,
    keyframe_time_sec: f64,
    playback_sec: f64,
    playback_step_per_sec: f64,
    playback_sec_per_step: f64,
    clip_param: f64,
    keyframe_param: f64,
}

impl Default for ClipController {
    fn default() -> Self {
        Self {
            name: UNNAMED_CONTROLLER.to_owned(),
            clip_index: 0,
            keyframe_index: 0,
            clip_time_step: 0,
            keyframe_time_step: 0,
            playback_step: 0,
            clip_time_sec: 0.0,
            keyframe_time_sec: 0.0,
            playback_sec: 0.0,
            playback_step_per_sec: 1.0,
            playback_sec_per_step: 1.0,
            clip_param: 0.0,
            keyframe_param: 0.0,
        }
    }
}

impl ClipController {
    /// Creates a controller playing `clip_index` from its start
    ///
    /// # Errors
    /// See `set_clip`
    pub fn new(
        name: &str,
        pool: &ClipPool,
        clip_index: usize,
        playback_step: i32,
        steps_per_sec: f64,
    ) -> Result<Self, ArmError> {
        let mut controller = Self::default();
        if !name.is_empty() {
            name.clone_into(&mut controller.name);
        }
        controller.set_clip(pool, clip_index, playback_step, steps_per_sec)?;
        Ok(controller)
    }

    /// Moves to the first keyframe of a clip with all time zeroed, then sets
    /// the playback rate. Returns the clip index.
    ///
    /// # Errors
    /// Returns `ArmError::IndexOutOfRange` for an unknown clip and
    /// `ArmError::InvalidRate` for a non-positive `steps_per_sec`
    pub fn set_clip(
        &mut self,
        pool: &ClipPool,
        clip_index: usize,
        playback_step: i32,
        steps_per_sec: f64,
    ) -> Result<usize, ArmError> {
        let clip = pool
            .clip(clip_index)
            .ok_or(ArmError::IndexOutOfRange(clip_index))?;
        if !steps_per_sec.is_finite() || steps_per_sec <= 0.0 {
            return Err(ArmError::InvalidRate);
        }
        self.clip_index = clip_index;
        self.keyframe_index = clip.keyframe_index_first;
        self.clip_time_step = 0;
        self.keyframe_time_step = 0;
        self.clip_time_sec = 0.0;
        self.keyframe_time_sec = 0.0;
        self.clip_param = 0.0;
        self.keyframe_param = 0.0;
        self.set_playback(playback_step, steps_per_sec)?;
        Ok(clip_index)
    }

    /// Sets the playback rate. `playback_step` scales time and its sign is the
    /// playback direction. `steps_per_sec` is the timeline's step rate.
    ///
    /// # Errors
    /// Returns `ArmError::InvalidRate` for a non-positive `steps_per_sec`
    pub fn set_playback(
        &mut self,
        playback_step: i32,
        steps_per_sec: f64,
    ) -> Result<i32, ArmError> {
        if !steps_per_sec.is_finite() || steps_per_sec <= 0.0 {
            return Err(ArmError::InvalidRate);
        }
        self.playback_step = playback_step;
        self.playback_sec = f64::from(playback_step);
        self.playback_step_per_sec = steps_per_sec;
        self.playback_sec_per_step = steps_per_sec.recip();
        Ok(playback_step)
    }

    /// Advances time by `dt` seconds, looping at both ends of the clip.
    /// Returns the keyframe index playback ends up in.
    ///
    /// # Errors
    /// See `update_with`
    pub fn update(&mut self, pool: &ClipPool, dt: f64) -> Result<usize, ArmError> {
        self.update_with(pool, dt, &LoopPolicy)
    }

    /// Advances time by `dt` seconds, asking `policy` what to do whenever an
    /// end of the current clip is crossed. An update may cross any number of
    /// keyframes and clip ends. Returns the keyframe index playback ends up in.
    ///
    /// # Errors
    /// Returns `ArmError::InvalidRate` if `dt` is not finite or too large to
    /// resolve against the keyframe durations. Returns an error if the
    /// current clip or a keyframe is not in the pool or if playback has to
    /// cross a keyframe without a positive duration. The controller is
    /// unchanged on error.
    pub fn update_with<P: TerminusPolicy + ?Sized>(
        &mut self,
        pool: &ClipPool,
        dt: f64,
        policy: &P,
    ) -> Result<usize, ArmError> {
        if !dt.is_finite() {
            return Err(ArmError::InvalidRate);
        }
        let mut cursor = Cursor {
            clip_index: self.clip_index,
            keyframe_index: self.keyframe_index,
            clip_time: self.clip_time_sec,
            keyframe_time: self.keyframe_time_sec,
            rate: self.playback_sec,
        };
        let advance = dt * cursor.rate;
        cursor.clip_time += advance;
        cursor.keyframe_time += advance;

        loop {
            let clip = pool
                .clip(cursor.clip_index)
                .ok_or(ArmError::IndexOutOfRange(cursor.clip_index))?;
            let duration = keyframe_duration(pool, cursor.keyframe_index)?;
            let past_end = if cursor.rate < 0.0 {
                cursor.keyframe_time > duration
            } else {
                cursor.keyframe_time >= duration
            };
            let before_start = cursor.keyframe_time < 0.0;
            if !past_end && !before_start {
                break;
            }
            if duration <= 0.0 {
                return Err(ArmError::DegenerateKeyframe(cursor.keyframe_index));
            }
            // Time too large for a keyframe step to change it
            let magnitude = cursor.keyframe_time.abs();
            if magnitude + duration <= magnitude {
                return Err(ArmError::InvalidRate);
            }

            if past_end {
                let overstep = cursor.keyframe_time - duration;
                if cursor.keyframe_index == clip.keyframe_index_final {
                    let action = policy.resolve(pool, clip, Terminus::Forward);
                    trace!(
                        "Clip {} forward terminus, overstep {overstep}: \
                        {action:?}",
                        clip.index
                    );
                    let playing = cursor.apply(
                        pool,
                        clip,
                        Terminus::Forward,
                        overstep,
                        action,
                    )?;
                    if !playing {
                        break;
                    }
                } else {
                    cursor.keyframe_index =
                        clip.next_keyframe(cursor.keyframe_index);
                    cursor.keyframe_time = overstep;
                }
            } else {
                let overstep = cursor.keyframe_time;
                if cursor.keyframe_index == clip.keyframe_index_first {
                    let action = policy.resolve(pool, clip, Terminus::Reverse);
                    trace!(
                        "Clip {} reverse terminus, overstep {overstep}: \
                        {action:?}",
                        clip.index
                    );
                    let playing = cursor.apply(
                        pool,
                        clip,
                        Terminus::Reverse,
                        overstep,
                        action,
                    )?;
                    if !playing {
                        break;
                    }
                } else {
                    cursor.keyframe_index =
                        clip.previous_keyframe(cursor.keyframe_index);
                    cursor.keyframe_time = overstep
                        + keyframe_duration(pool, cursor.keyframe_index)?;
                }
            }
        }

        let clip = pool
            .clip(cursor.clip_index)
            .ok_or(ArmError::IndexOutOfRange(cursor.clip_index))?;
        let keyframe = pool
            .keyframe(cursor.keyframe_index)
            .ok_or(ArmError::IndexOutOfRange(cursor.keyframe_index))?;

        self.clip_index = cursor.clip_index;
        self.keyframe_index = cursor.keyframe_index;
        self.clip_time_sec = cursor.clip_time;
        self.keyframe_time_sec = cursor.keyframe_time;
        self.playback_sec = cursor.rate;
        self.playback_step = cursor.rate as i32;
        self.clip_time_step =
            (cursor.clip_time * self.playback_step_per_sec).floor() as i32;
        self.keyframe_time_step =
            (cursor.keyframe_time * self.playback_step_per_sec).floor() as i32;
        self.keyframe_param = cursor.keyframe_time * keyframe.duration_inv;
        self.clip_param = cursor.clip_time * clip.duration_inv;
        Ok(self.keyframe_index)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn clip_index(&self) -> usize {
        self.clip_index
    }

    #[must_use]
    pub const fn keyframe_index(&self) -> usize {
        self.keyframe_index
    }

    #[must_use]
    pub const fn clip_time_step(&self) -> i32 {
        self.clip_time_step
    }

    #[must_use]
    pub const fn keyframe_time_step(&self) -> i32 {
        self.keyframe_time_step
    }

    #[must_use]
    pub const fn playback_step(&self) -> i32 {
        self.playback_step
    }

    #[must_use]
    pub const fn clip_time_sec(&self) -> f64 {
        self.clip_time_sec
    }

    #[must_use]
    pub const fn keyframe_time_sec(&self) -> f64 {
        self.keyframe_time_sec
    }

    /// Signed multiplier applied to `dt` on each update
    #[must_use]
    pub const fn playback_sec(&self) -> f64 {
        self.playback_sec
    }

    #[must_use]
    pub const fn playback_step_per_sec(&self) -> f64 {
        self.playback_step_per_sec
    }

    #[must_use]
    pub const fn playback_sec_per_step(&self) -> f64 {
        self.playback_sec_per_step
    }

    /// Position within the clip, 0 at the first keyframe and 1 at the end
    #[must_use]
    pub const fn clip_param(&self) -> f64 {
        self.clip_param
    }

    /// Interpolation parameter between the current keyframe's samples
    #[must_use]
    pub const fn keyframe_param(&self) -> f64 {
        self.keyframe_param
    }
}
