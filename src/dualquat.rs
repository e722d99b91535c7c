use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Dual quaternion
/// GLM has support in the `GLM_GTX_dual_quaternion` extension but this does not
/// seem to be available in the `nalgebra_glm` implementation. So some
/// functionality is implemented here using `glm::Quat`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DualQuat {
    pub real: glm::Quat,
    pub dual: glm::Quat,
}

impl Default for DualQuat {
    fn default() -> Self {
        Self {
            // Real part contains the rotation
            real: glm::quat(0.0, 0.0, 0.0, 1.0),
            // Dual part contains the translation but is also effected by
            // the rotation
            dual: glm::quat(0.0, 0.0, 0.0, 0.0),
        }
    }
}

impl DualQuat {
    /// Creates a unit dual quaternion from a rotation and a translation. The
    /// rotation is applied first.
    #[must_use]
    pub fn new(rot: &glm::Quat, trans: &glm::Vec3) -> Self {
        let pure = glm::quat(trans.x, trans.y, trans.z, 0.0);
        Self {
            real: *rot,
            dual: pure * *rot * 0.5,
        }
    }
}

/// Conversion to GLSL shader ready mat2x4
impl From<DualQuat> for [[f32; 4]; 2] {
    fn from(dq: DualQuat) -> [[f32; 4]; 2] {
        [
            [
                dq.real.coords.x,
                dq.real.coords.y,
                dq.real.coords.z,
                dq.real.coords.w,
            ],
            [
                dq.dual.coords.x,
                dq.dual.coords.y,
                dq.dual.coords.z,
                dq.dual.coords.w,
            ],
        ]
    }
}

/// Conversion from a column major rotation and translation matrix
impl From<[[f32; 4]; 4]> for DualQuat {
    fn from(arr: [[f32; 4]; 4]) -> Self {
        let m: glm::Mat4 = arr.into();
        from_mat4(&m)
    }
}

#[must_use]
pub fn add(q1: &DualQuat, q2: &DualQuat) -> DualQuat {
    DualQuat {
        real: q1.real + q2.real,
        dual: q1.dual + q2.dual,
    }
}

#[must_use]
pub fn mul(q1: &DualQuat, q2: &DualQuat) -> DualQuat {
    DualQuat {
        real: q1.real * q2.real,
        dual: q1.real * q2.dual + q1.dual * q2.real,
    }
}

#[must_use]
pub fn scale(q: &DualQuat, s: f32) -> DualQuat {
    DualQuat {
        real: q.real * s,
        dual: q.dual * s,
    }
}

#[must_use]
pub fn conjugate(q: &DualQuat) -> DualQuat {
    DualQuat {
        real: q.real.conjugate(),
        dual: q.dual.conjugate(),
    }
}

/// Scales so that the real part has unit length. A zero real part can't be
/// normalized so the identity is returned in that case.
#[must_use]
pub fn normalize(q: &DualQuat) -> DualQuat {
    let len = q.real.norm();
    if len <= f32::EPSILON {
        return DualQuat::default();
    }
    scale(q, 1.0 / len)
}

/// Splits a unit dual quaternion into its rotation and translation
#[must_use]
pub fn decompose(q: &DualQuat) -> (glm::Quat, glm::Vec3) {
    let t = q.dual * q.real.conjugate() * 2.0;
    (q.real, glm::vec3(t.i, t.j, t.k))
}

/// Converts a unit dual quaternion to a rotation and translation matrix
#[must_use]
pub fn to_mat4(q: &DualQuat) -> glm::Mat4 {
    let (rot, trans) = decompose(q);
    glm::translation(&trans) * glm::quat_to_mat4(&rot)
}

/// Converts a rotation and translation matrix to a unit dual quaternion. Any
/// scale in the matrix should be removed first.
#[must_use]
pub fn from_mat4(m: &glm::Mat4) -> DualQuat {
    let rot = glm::quat_normalize(&glm::to_quat(m));
    let trans = glm::vec3(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    DualQuat::new(&rot, &trans)
}

/// Dual quaternion linear blending
///
/// Takes the shortest path by negating `q2` when the real parts point away
/// from each other, then normalizes the blended result.
#[must_use]
pub fn dlb(q1: &DualQuat, q2: &DualQuat, t: f32) -> DualQuat {
    let q2 = if q1.real.dot(&q2.real) < 0.0 {
        scale(q2, -1.0)
    } else {
        *q2
    };
    normalize(&add(&scale(q1, 1.0 - t), &scale(&q2, t)))
}

/// Separate interpolation: spherical for the rotation and linear for the
/// translation
#[must_use]
pub fn sep(q1: &DualQuat, q2: &DualQuat, t: f32) -> DualQuat {
    let (r1, t1) = decompose(q1);
    let (r2, t2) = decompose(q2);
    let r2 = if r1.dot(&r2) < 0.0 { -r2 } else { r2 };
    let rot = glm::quat_slerp(&r1, &r2, t);
    let trans = t1 * (1.0 - t) + t2 * t;
    DualQuat::new(&rot, &trans)
}
