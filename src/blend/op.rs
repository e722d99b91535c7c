use crate::{
    dualquat::{self, DualQuat},
    spatial_pose::{euler_to_mat4, lerp4, mat4_to_euler, EulerOrder},
};
use nalgebra_glm as glm;
use std::fmt;

/// Most control values one blend operation takes
pub const CONTROL_LIMIT: usize = 16;
/// Most scalar inputs one blend operation takes
pub const INPUT_LIMIT: usize = 8;

/// Input used when a node has none
pub const DEFAULT_INPUT: f32 = 0.5;

/// Blend functions for each channel group of a `SpatialPose`
///
/// Every method receives the control values of one channel group and the
/// node's scalar inputs and returns the blended value. Controls are ordered
/// and the first input is the blend parameter along them, so two controls
/// with an input of 0.5 give their midpoint.
pub trait BlendOpSet: fmt::Debug + Send + Sync {
    fn blend_matrix(&self, controls: &[glm::Mat4], inputs: &[f32]) -> glm::Mat4;

    fn blend_dual_quat(&self, controls: &[DualQuat], inputs: &[f32]) -> DualQuat;

    /// Euler angles in degrees
    fn blend_rotate(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4;

    fn blend_scale(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4;

    fn blend_translate(
        &self,
        controls: &[glm::Vec4],
        inputs: &[f32],
    ) -> glm::Vec4;

    fn blend_user(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4;
}

fn unit_scale() -> glm::Vec4 {
    glm::vec4(1.0, 1.0, 1.0, 1.0)
}

/// Position along `count` controls for a parameter in 0..=1, as the index of
/// the first control of a segment and the parameter within that segment.
/// `count` must be at least 2.
fn segment(count: usize, inputs: &[f32]) -> (usize, f32) {
    let u = inputs.first().copied().unwrap_or(DEFAULT_INPUT).clamp(0.0, 1.0);
    let last = count - 1;
    let x = u * last as f32;
    let i = (x.floor() as usize).min(last - 1);
    (i, x - i as f32)
}

// Blends piecewise along the controls, with `empty` for no controls
fn piecewise<T: Copy>(
    controls: &[T],
    inputs: &[f32],
    empty: T,
    blend: impl Fn(&T, &T, f32) -> T,
) -> T {
    match controls {
        [] => empty,
        [only] => *only,
        _ => {
            let (i, t) = segment(controls.len(), inputs);
            blend(&controls[i], &controls[i + 1], t)
        }
    }
}

fn nearest<T: Copy>(controls: &[T], inputs: &[f32], empty: T) -> T {
    piecewise(controls, inputs, empty, |a, b, t| if t < 0.5 { *a } else { *b })
}

/// Linear interpolation for every channel group
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearBlend;

impl BlendOpSet for LinearBlend {
    fn blend_matrix(&self, controls: &[glm::Mat4], inputs: &[f32]) -> glm::Mat4 {
        piecewise(controls, inputs, glm::Mat4::identity(), |a, b, t| {
            a * (1.0 - t) + b * t
        })
    }

    fn blend_dual_quat(&self, controls: &[DualQuat], inputs: &[f32]) -> DualQuat {
        piecewise(controls, inputs, DualQuat::default(), |a, b, t| {
            dualquat::add(&dualquat::scale(a, 1.0 - t), &dualquat::scale(b, t))
        })
    }

    fn blend_rotate(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        piecewise(controls, inputs, glm::Vec4::zeros(), lerp4)
    }

    fn blend_scale(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        piecewise(controls, inputs, unit_scale(), lerp4)
    }

    fn blend_translate(
        &self,
        controls: &[glm::Vec4],
        inputs: &[f32],
    ) -> glm::Vec4 {
        piecewise(controls, inputs, glm::Vec4::zeros(), lerp4)
    }

    fn blend_user(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        piecewise(controls, inputs, glm::Vec4::zeros(), lerp4)
    }
}

/// Spherical interpolation of rotations and linear interpolation of
/// everything else
///
/// Euler rotations are turned into quaternions with `order`, slerped along
/// the shortest arc and turned back. Matrices are treated as rigid
/// transforms and any scale in them is lost.
#[derive(Clone, Copy, Debug, Default)]
pub struct SphericalBlend {
    pub order: EulerOrder,
}

impl SphericalBlend {
    fn slerp_euler(&self, a: &glm::Vec4, b: &glm::Vec4, t: f32) -> glm::Vec4 {
        let qa = glm::to_quat(&euler_to_mat4(&a.xyz(), self.order));
        let qb = glm::to_quat(&euler_to_mat4(&b.xyz(), self.order));
        let qb = if qa.dot(&qb) < 0.0 { -qb } else { qb };
        let q = glm::quat_slerp(&qa, &qb, t);
        mat4_to_euler(&glm::quat_to_mat4(&q), self.order)
            .push(a.w * (1.0 - t) + b.w * t)
    }
}

impl BlendOpSet for SphericalBlend {
    fn blend_matrix(&self, controls: &[glm::Mat4], inputs: &[f32]) -> glm::Mat4 {
        piecewise(controls, inputs, glm::Mat4::identity(), |a, b, t| {
            let blended =
                dualquat::sep(&dualquat::from_mat4(a), &dualquat::from_mat4(b), t);
            dualquat::to_mat4(&blended)
        })
    }

    fn blend_dual_quat(&self, controls: &[DualQuat], inputs: &[f32]) -> DualQuat {
        piecewise(controls, inputs, DualQuat::default(), dualquat::dlb)
    }

    fn blend_rotate(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        piecewise(controls, inputs, glm::Vec4::zeros(), |a, b, t| {
            self.slerp_euler(a, b, t)
        })
    }

    fn blend_scale(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        LinearBlend.blend_scale(controls, inputs)
    }

    fn blend_translate(
        &self,
        controls: &[glm::Vec4],
        inputs: &[f32],
    ) -> glm::Vec4 {
        LinearBlend.blend_translate(controls, inputs)
    }

    fn blend_user(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        LinearBlend.blend_user(controls, inputs)
    }
}

/// Picks the control closest to the blend parameter with no interpolation
#[derive(Clone, Copy, Debug, Default)]
pub struct NearestBlend;

impl BlendOpSet for NearestBlend {
    fn blend_matrix(&self, controls: &[glm::Mat4], inputs: &[f32]) -> glm::Mat4 {
        nearest(controls, inputs, glm::Mat4::identity())
    }

    fn blend_dual_quat(&self, controls: &[DualQuat], inputs: &[f32]) -> DualQuat {
        nearest(controls, inputs, DualQuat::default())
    }

    fn blend_rotate(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        nearest(controls, inputs, glm::Vec4::zeros())
    }

    fn blend_scale(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        nearest(controls, inputs, unit_scale())
    }

    fn blend_translate(
        &self,
        controls: &[glm::Vec4],
        inputs: &[f32],
    ) -> glm::Vec4 {
        nearest(controls, inputs, glm::Vec4::zeros())
    }

    fn blend_user(&self, controls: &[glm::Vec4], inputs: &[f32]) -> glm::Vec4 {
        nearest(controls, inputs, glm::Vec4::zeros())
    }
}
