//! Tests for the dualquat module
//!
//! Several tests use easy to compare values that are not unit dual
//! quaternions. The maths does not require unit length, only the conversions
//! to and from matrices do.

use armature::dualquat::{self, DualQuat};
use log::info;
use nalgebra_glm as glm;
use std::sync::Once;

const EPSILON: f32 = 0.0001_f32;
static INIT: Once = Once::new();

/// Initializes logging once per test run
fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

/// A unit dual quaternion times its conjugate is the identity
fn check_unit(dq: &DualQuat) {
    let unit = dualquat::mul(dq, &dualquat::conjugate(dq));
    let c = glm::quat_equal_eps(&unit.real, &glm::Quat::identity(), EPSILON);
    assert!(c.x && c.y && c.z && c.w);
    let c = glm::quat_equal_eps(
        &unit.dual,
        &glm::quat(0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32),
        EPSILON,
    );
    assert!(c.x && c.y && c.z && c.w);
}

fn check_mat4(m1: &glm::Mat4, m2: &glm::Mat4) {
    let c = glm::equal_columns_eps(m1, m2, EPSILON);
    assert!(c.x && c.y && c.z && c.w, "{m1:?} != {m2:?}");
}

fn rigid(angle: f32, axis: &glm::Vec3, trans: &glm::Vec3) -> glm::Mat4 {
    glm::translation(trans) * glm::rotation(angle, axis)
}

#[test]
fn default_is_identity() {
    let dq = DualQuat::default();
    assert_eq!(dq.real, glm::Quat::identity());
    assert_eq!(dq.dual, glm::quat(0.0_f32, 0.0_f32, 0.0_f32, 0.0_f32));
    assert_eq!(dualquat::to_mat4(&dq), glm::Mat4::identity());
}

#[test]
fn new_matches_matrix() {
    init_tests();

    let rot = glm::quat_angle_axis(
        0.93_f32,
        &glm::normalize(&glm::vec3(0.2_f32, -0.7_f32, 0.4_f32)),
    );
    let trans = glm::vec3(3.5_f32, -120.0_f32, 0.25_f32);
    let dq = DualQuat::new(&rot, &trans);
    check_unit(&dq);

    // d = t * r / 2 with t as a quaternion with zero scalar part
    let pure = glm::quat(trans.x, trans.y, trans.z, 0.0_f32);
    let c = glm::quat_equal_eps(&dq.dual, &(pure * rot * 0.5_f32), EPSILON);
    assert!(c.x && c.y && c.z && c.w);

    let m = glm::translation(&trans) * glm::quat_to_mat4(&rot);
    info!("new m={m:?}");
    check_mat4(&m, &dualquat::to_mat4(&dq));
}

#[test]
fn into_shader_array() {
    let dq = DualQuat {
        real: glm::quat(1.0, 2.0, 3.0, 4.0),
        dual: glm::quat(5.0, 6.0, 7.0, 8.0),
    };
    let m: [[f32; 4]; 2] = dq.into();
    assert_eq!(m[0], [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(m[1], [5.0, 6.0, 7.0, 8.0]);
}

#[test]
fn from_column_array() {
    let arr: [[f32; 4]; 4] = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 0.6, 0.8, 0.0],
        [0.0, -0.8, 0.6, 0.0],
        [-2.0, 4.0, 1.5, 1.0],
    ];
    let dq: DualQuat = arr.into();
    check_unit(&dq);
    let m: glm::Mat4 = arr.into();
    check_mat4(&m, &dualquat::to_mat4(&dq));
}

#[test]
fn add_and_scale() {
    let dq1 = DualQuat {
        real: glm::quat(1.0, 2.0, 3.0, 4.0),
        dual: glm::quat(-1.0, -2.0, -3.0, -4.0),
    };
    let dq2 = DualQuat {
        real: glm::quat(4.0, 3.0, 2.0, 1.0),
        dual: glm::quat(-4.0, -3.0, -2.0, -1.0),
    };
    let sum = dualquat::add(&dq1, &dq2);
    assert_eq!(sum.real, glm::quat(5.0, 5.0, 5.0, 5.0));
    assert_eq!(sum.dual, glm::quat(-5.0, -5.0, -5.0, -5.0));

    let half = dualquat::scale(&sum, 0.5);
    assert_eq!(half.real, glm::quat(2.5, 2.5, 2.5, 2.5));
}

#[test]
fn mul_composes_transforms() {
    let a = rigid(0.4, &glm::vec3(0.0, 0.0, 1.0), &glm::vec3(1.0, 2.0, 3.0));
    let b = rigid(-1.1, &glm::vec3(1.0, 0.0, 0.0), &glm::vec3(-4.0, 0.5, 0.0));
    let dq = dualquat::mul(&dualquat::from_mat4(&a), &dualquat::from_mat4(&b));
    check_unit(&dq);
    check_mat4(&(a * b), &dualquat::to_mat4(&dq));
}

#[test]
fn normalize() {
    let dq = dualquat::scale(
        &DualQuat::new(
            &glm::quat_angle_axis(0.3_f32, &glm::vec3(0.0, 1.0, 0.0)),
            &glm::vec3(2.0, 0.0, -1.0),
        ),
        3.0,
    );
    check_unit(&dualquat::normalize(&dq));

    // Nothing to normalize gives the identity
    let zero = dualquat::scale(&dq, 0.0);
    assert_eq!(dualquat::normalize(&zero), DualQuat::default());
}

#[test]
fn decompose() {
    let rot = glm::quat_angle_axis(1.2_f32, &glm::vec3(0.0, 0.0, 1.0));
    let trans = glm::vec3(7.0_f32, -3.0, 0.5);
    let (r, t) = dualquat::decompose(&DualQuat::new(&rot, &trans));
    let c = glm::quat_equal_eps(&r, &rot, EPSILON);
    assert!(c.x && c.y && c.z && c.w);
    let c = glm::equal_eps(&t, &trans, EPSILON);
    assert!(c.x && c.y && c.z);
}

#[test]
fn from_mat4_round_trip() {
    let m = rigid(
        -0.261,
        &glm::vec3(0.0, 0.0, 1.0),
        &glm::vec3(31.0, -192.52, -0.34),
    );
    let dq = dualquat::from_mat4(&m);
    check_unit(&dq);
    check_mat4(&m, &dualquat::to_mat4(&dq));
}

#[test]
fn blends_hit_endpoints() {
    init_tests();

    let axis = glm::vec3(0.0, 1.0, 0.0);
    let dq1 = dualquat::from_mat4(&rigid(0.2, &axis, &glm::vec3(0.0, 0.0, 0.0)));
    let dq2 = dualquat::from_mat4(&rigid(1.4, &axis, &glm::vec3(4.0, 0.0, 2.0)));
    for blend in [dualquat::dlb, dualquat::sep] {
        check_mat4(&dualquat::to_mat4(&dq1), &dualquat::to_mat4(&blend(&dq1, &dq2, 0.0)));
        check_mat4(&dualquat::to_mat4(&dq2), &dualquat::to_mat4(&blend(&dq1, &dq2, 1.0)));
        check_unit(&blend(&dq1, &dq2, 0.37));
    }
}

#[test]
fn sep_halfway() {
    let axis = glm::vec3(0.0, 0.0, 1.0);
    let dq1 = dualquat::from_mat4(&rigid(0.0, &axis, &glm::vec3(0.0, 0.0, 0.0)));
    let dq2 = dualquat::from_mat4(&rigid(1.0, &axis, &glm::vec3(2.0, 4.0, 0.0)));
    let mid = dualquat::sep(&dq1, &dq2, 0.5);
    info!("sep halfway={mid:?}");
    let m = rigid(0.5, &axis, &glm::vec3(1.0, 2.0, 0.0));
    check_mat4(&m, &dualquat::to_mat4(&mid));
}

#[test]
fn dlb_takes_shortest_path() {
    // The same rotation with the sign flipped must blend like the original
    let dq1 = dualquat::from_mat4(&rigid(
        0.5,
        &glm::vec3(1.0, 0.0, 0.0),
        &glm::vec3(1.0, 1.0, 1.0),
    ));
    let flipped = dualquat::scale(&dq1, -1.0);
    let blended = dualquat::dlb(&dq1, &flipped, 0.5);
    check_mat4(&dualquat::to_mat4(&dq1), &dualquat::to_mat4(&blended));
}
