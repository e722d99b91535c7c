use crate::dualquat::DualQuat;
use bitflags::bitflags;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Selects which axes of a pose are authored. The four nibbles hold
    /// rotation, scale, translation and user axes in that order.
    ///
    /// An empty set places no restriction on the pose, so every axis takes
    /// part in `convert` and `restore`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PoseChannel: u16 {
        const ROTATE_X = 0x0001;
        const ROTATE_Y = 0x0002;
        const ROTATE_Z = 0x0004;
        const ROTATE_W = 0x0008;
        const ROTATE_XY = Self::ROTATE_X.bits() | Self::ROTATE_Y.bits();
        const ROTATE_YZ = Self::ROTATE_Y.bits() | Self::ROTATE_Z.bits();
        const ROTATE_ZX = Self::ROTATE_Z.bits() | Self::ROTATE_X.bits();
        const ROTATE_XYZ = Self::ROTATE_XY.bits() | Self::ROTATE_Z.bits();

        const SCALE_X = 0x0010;
        const SCALE_Y = 0x0020;
        const SCALE_Z = 0x0040;
        const SCALE_W = 0x0080;
        const SCALE_XY = Self::SCALE_X.bits() | Self::SCALE_Y.bits();
        const SCALE_YZ = Self::SCALE_Y.bits() | Self::SCALE_Z.bits();
        const SCALE_ZX = Self::SCALE_Z.bits() | Self::SCALE_X.bits();
        const SCALE_XYZ = Self::SCALE_XY.bits() | Self::SCALE_Z.bits();

        const TRANSLATE_X = 0x0100;
        const TRANSLATE_Y = 0x0200;
        const TRANSLATE_Z = 0x0400;
        const TRANSLATE_W = 0x0800;
        const TRANSLATE_XY = Self::TRANSLATE_X.bits() | Self::TRANSLATE_Y.bits();
        const TRANSLATE_YZ = Self::TRANSLATE_Y.bits() | Self::TRANSLATE_Z.bits();
        const TRANSLATE_ZX = Self::TRANSLATE_Z.bits() | Self::TRANSLATE_X.bits();
        const TRANSLATE_XYZ = Self::TRANSLATE_XY.bits() | Self::TRANSLATE_Z.bits();

        const USER_X = 0x1000;
        const USER_Y = 0x2000;
        const USER_Z = 0x4000;
        const USER_W = 0x8000;
        const USER_XY = Self::USER_X.bits() | Self::USER_Y.bits();
        const USER_YZ = Self::USER_Y.bits() | Self::USER_Z.bits();
        const USER_ZX = Self::USER_Z.bits() | Self::USER_X.bits();
        const USER_XYZ = Self::USER_XY.bits() | Self::USER_Z.bits();
    }
}

const ROTATE_SHIFT: u16 = 0;
const SCALE_SHIFT: u16 = 4;
const TRANSLATE_SHIFT: u16 = 8;

// Below this a matrix column is treated as collapsed and is not normalized
const COLLAPSED: f32 = 1.0e-6;

// Sine of the middle Euler angle beyond which the decomposition is locked
const GIMBAL_LIMIT: f32 = 0.999_99;

/// Order in which the three Euler angles are applied. `Xyz` rotates about X
/// first and Z last.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum EulerOrder {
    #[default]
    Xyz,
    Yzx,
    Zxy,
    Yxz,
    Xzy,
    Zyx,
}

impl EulerOrder {
    /// Axis indices in application order
    #[must_use]
    pub const fn axes(self) -> [usize; 3] {
        match self {
            Self::Xyz => [0, 1, 2],
            Self::Yzx => [1, 2, 0],
            Self::Zxy => [2, 0, 1],
            Self::Yxz => [1, 0, 2],
            Self::Xzy => [0, 2, 1],
            Self::Zyx => [2, 1, 0],
        }
    }

    const fn is_cyclic(self) -> bool {
        matches!(self, Self::Xyz | Self::Yzx | Self::Zxy)
    }

    /// Value used in pose group files
    #[must_use]
    pub const fn to_i32(self) -> i32 {
        match self {
            Self::Xyz => 0,
            Self::Yzx => 1,
            Self::Zxy => 2,
            Self::Yxz => 3,
            Self::Xzy => 4,
            Self::Zyx => 5,
        }
    }

    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Xyz),
            1 => Some(Self::Yzx),
            2 => Some(Self::Zxy),
            3 => Some(Self::Yxz),
            4 => Some(Self::Xzy),
            5 => Some(Self::Zyx),
            _ => None,
        }
    }
}

/// One node's transform
///
/// The vector fields are the authoring representation and `transform_mat` is
/// the composed one. They are only brought back in sync by `convert` and
/// `restore`. Rotation is Euler angles in degrees with `w` unused.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialPose {
    pub transform_mat: glm::Mat4,
    pub transform_dq: DualQuat,
    pub rotate: glm::Vec4,
    pub scale: glm::Vec4,
    pub translate: glm::Vec4,
    pub user: glm::Vec4,
}

impl Default for SpatialPose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Picks the x, y and z values of `v` that `channel` marks active and uses
/// `identity` for the others
fn active_xyz(
    channel: PoseChannel,
    shift: u16,
    v: &glm::Vec4,
    identity: f32,
) -> glm::Vec3 {
    let bits = (channel.bits() >> shift) & 0xF;
    glm::vec3(
        if channel.is_empty() || bits & 1 != 0 { v.x } else { identity },
        if channel.is_empty() || bits & 2 != 0 { v.y } else { identity },
        if channel.is_empty() || bits & 4 != 0 { v.z } else { identity },
    )
}

fn axis_rotation(axis: usize, degrees: f32) -> glm::Mat4 {
    let mut unit = glm::Vec3::zeros();
    unit[axis] = 1.0;
    glm::rotation(degrees.to_radians(), &unit)
}

/// Rotation matrix from Euler angles in degrees
#[must_use]
pub fn euler_to_mat4(degrees: &glm::Vec3, order: EulerOrder) -> glm::Mat4 {
    let [i, j, k] = order.axes();
    axis_rotation(k, degrees[k])
        * axis_rotation(j, degrees[j])
        * axis_rotation(i, degrees[i])
}

/// Euler angles in degrees from a pure rotation matrix. At gimbal lock the
/// last applied angle is set to zero and the first absorbs the remainder.
#[must_use]
pub fn mat4_to_euler(r: &glm::Mat4, order: EulerOrder) -> glm::Vec3 {
    let [i, j, k] = order.axes();
    let sign = if order.is_cyclic() { 1.0 } else { -1.0 };
    let s = (-sign * r[(k, i)]).clamp(-1.0, 1.0);
    let mut out = glm::Vec3::zeros();
    out[j] = s.asin();
    if s.abs() < GIMBAL_LIMIT {
        out[i] = (sign * r[(k, j)]).atan2(r[(k, k)]);
        out[k] = (sign * r[(j, i)]).atan2(r[(i, i)]);
    } else {
        out[i] = (-sign * r[(j, k)]).atan2(r[(j, j)]);
        out[k] = 0.0;
    }
    out.map(f32::to_degrees)
}

impl SpatialPose {
    #[must_use]
    pub fn identity() -> Self {
        Self {
            transform_mat: glm::Mat4::identity(),
            transform_dq: DualQuat::default(),
            rotate: glm::Vec4::zeros(),
            scale: glm::vec4(1.0, 1.0, 1.0, 1.0),
            translate: glm::Vec4::zeros(),
            user: glm::Vec4::zeros(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::identity();
    }

    /// Builds `transform_mat` and `transform_dq` from the vector fields. The
    /// matrix is translation * rotation * scale, with `order` only choosing
    /// how the Euler angles compose into the rotation.
    pub fn convert(&mut self, channel: PoseChannel, order: EulerOrder) {
        let rotate = active_xyz(channel, ROTATE_SHIFT, &self.rotate, 0.0);
        let scale = active_xyz(channel, SCALE_SHIFT, &self.scale, 1.0);
        let translate =
            active_xyz(channel, TRANSLATE_SHIFT, &self.translate, 0.0);

        let rot = euler_to_mat4(&rotate, order);
        self.transform_mat =
            glm::translation(&translate) * rot * glm::scaling(&scale);
        self.transform_dq = DualQuat::new(&glm::to_quat(&rot), &translate);
    }

    /// Decomposes `transform_mat` back into the vector fields. Axes outside of
    /// `channel` are written with identity values. The `w` components are
    /// left alone.
    pub fn restore(&mut self, channel: PoseChannel, order: EulerOrder) {
        let m = self.transform_mat;
        let translate = glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)]);

        let mut scale = glm::Vec3::zeros();
        let mut rot = glm::Mat4::identity();
        for c in 0..3 {
            let len = glm::vec3(m[(0, c)], m[(1, c)], m[(2, c)]).norm();
            scale[c] = len;
            let inv = if len > COLLAPSED { 1.0 / len } else { 1.0 };
            for r in 0..3 {
                rot[(r, c)] = m[(r, c)] * inv;
            }
        }
        let rotate = mat4_to_euler(&rot, order);

        let rotate = active_xyz(channel, ROTATE_SHIFT, &rotate.push(0.0), 0.0);
        let scale = active_xyz(channel, SCALE_SHIFT, &scale.push(1.0), 1.0);
        let translate =
            active_xyz(channel, TRANSLATE_SHIFT, &translate.push(0.0), 0.0);

        self.rotate = rotate.push(self.rotate.w);
        self.scale = scale.push(self.scale.w);
        self.translate = translate.push(self.translate.w);
        self.transform_dq = DualQuat::new(&glm::to_quat(&rot), &translate);
    }

    /// Copies rotation, scale and translation only
    pub fn copy(&mut self, input: &Self) {
        self.rotate = input.rotate;
        self.scale = input.scale;
        self.translate = input.translate;
    }

    /// Layers `rhs` onto `lhs`: rotation and translation add, scale
    /// multiplies
    pub fn concat(&mut self, lhs: &Self, rhs: &Self) {
        self.translate = lhs.translate + rhs.translate;
        self.rotate = lhs.rotate + rhs.rotate;
        self.scale = lhs.scale.component_mul(&rhs.scale);
    }

    /// Removes `rhs` from `lhs`, undoing `concat`
    pub fn deconcat(&mut self, lhs: &Self, rhs: &Self) {
        self.translate = lhs.translate - rhs.translate;
        self.rotate = lhs.rotate - rhs.rotate;
        self.scale = lhs.scale.component_div(&rhs.scale);
    }

    /// Linear interpolation of rotation, scale and translation. Rotation is
    /// interpolated per Euler angle.
    pub fn lerp(&mut self, pose0: &Self, pose1: &Self, u: f32) {
        self.translate = lerp4(&pose0.translate, &pose1.translate, u);
        self.rotate = lerp4(&pose0.rotate, &pose1.rotate, u);
        self.scale = lerp4(&pose0.scale, &pose1.scale, u);
    }
}

pub(crate) fn lerp4(a: &glm::Vec4, b: &glm::Vec4, u: f32) -> glm::Vec4 {
    a * (1.0 - u) + b * u
}
