//! Tests for the spatial_pose module

use armature::{
    dualquat,
    spatial_pose::{euler_to_mat4, EulerOrder, PoseChannel, SpatialPose},
};
use log::info;
use nalgebra_glm as glm;
use std::sync::Once;

const EPSILON: f32 = 0.0005_f32;
static INIT: Once = Once::new();

/// Initializes logging once per test run
fn init_tests() {
    INIT.call_once(|| {
        env_logger::init();
    });
}

fn check_vec4(a: &glm::Vec4, b: &glm::Vec4) {
    let c = glm::equal_eps(a, b, EPSILON);
    assert!(c.x && c.y && c.z && c.w, "{a:?} != {b:?}");
}

fn check_mat4(m1: &glm::Mat4, m2: &glm::Mat4) {
    let c = glm::equal_columns_eps(m1, m2, EPSILON);
    assert!(c.x && c.y && c.z && c.w, "{m1:?} != {m2:?}");
}

fn posed() -> SpatialPose {
    SpatialPose {
        rotate: glm::vec4(20.0, -35.0, 60.0, 0.0),
        scale: glm::vec4(2.0, 0.5, 1.5, 1.0),
        translate: glm::vec4(1.0, -2.0, 3.0, 0.0),
        ..SpatialPose::identity()
    }
}

#[test]
fn identity_round_trip() {
    let mut pose = SpatialPose::identity();
    pose.convert(PoseChannel::empty(), EulerOrder::Xyz);
    assert_eq!(pose.transform_mat, glm::Mat4::identity());
    pose.restore(PoseChannel::empty(), EulerOrder::Xyz);
    assert_eq!(pose, SpatialPose::identity());
}

#[test]
fn convert_is_translate_rotate_scale() {
    init_tests();

    let mut pose = posed();
    pose.convert(PoseChannel::empty(), EulerOrder::Zyx);
    let expected = glm::translation(&glm::vec3(1.0, -2.0, 3.0))
        * euler_to_mat4(&glm::vec3(20.0, -35.0, 60.0), EulerOrder::Zyx)
        * glm::scaling(&glm::vec3(2.0, 0.5, 1.5));
    info!("converted={:?}", pose.transform_mat);
    check_mat4(&pose.transform_mat, &expected);

    // The dual quaternion holds the same rotation and translation
    let (_, t) = dualquat::decompose(&pose.transform_dq);
    let c = glm::equal_eps(&t, &glm::vec3(1.0, -2.0, 3.0), EPSILON);
    assert!(c.x && c.y && c.z);
}

#[test]
fn convert_restore_round_trip() {
    for order in [
        EulerOrder::Xyz,
        EulerOrder::Yzx,
        EulerOrder::Zxy,
        EulerOrder::Yxz,
        EulerOrder::Xzy,
        EulerOrder::Zyx,
    ] {
        let mut pose = posed();
        pose.convert(PoseChannel::empty(), order);
        let mut restored = pose;
        restored.rotate = glm::Vec4::zeros();
        restored.scale = glm::vec4(1.0, 1.0, 1.0, 1.0);
        restored.translate = glm::Vec4::zeros();
        restored.restore(PoseChannel::empty(), order);
        check_vec4(&restored.rotate, &pose.rotate);
        check_vec4(&restored.scale, &pose.scale);
        check_vec4(&restored.translate, &pose.translate);
    }
}

#[test]
fn channel_masks_axes() {
    let mut pose = posed();
    let channel = PoseChannel::TRANSLATE_X | PoseChannel::ROTATE_Z;
    pose.convert(channel, EulerOrder::Xyz);
    let expected = glm::translation(&glm::vec3(1.0, 0.0, 0.0))
        * euler_to_mat4(&glm::vec3(0.0, 0.0, 60.0), EulerOrder::Xyz);
    check_mat4(&pose.transform_mat, &expected);

    pose.restore(channel, EulerOrder::Xyz);
    check_vec4(&pose.translate, &glm::vec4(1.0, 0.0, 0.0, 0.0));
    check_vec4(&pose.rotate, &glm::vec4(0.0, 0.0, 60.0, 0.0));
    check_vec4(&pose.scale, &glm::vec4(1.0, 1.0, 1.0, 1.0));
}

#[test]
fn copy_is_partial() {
    let mut source = posed();
    source.user = glm::vec4(9.0, 9.0, 9.0, 9.0);
    source.convert(PoseChannel::empty(), EulerOrder::Xyz);

    let mut pose = SpatialPose::identity();
    pose.copy(&source);
    assert_eq!(pose.rotate, source.rotate);
    assert_eq!(pose.scale, source.scale);
    assert_eq!(pose.translate, source.translate);
    assert_eq!(pose.user, glm::Vec4::zeros());
    assert_eq!(pose.transform_mat, glm::Mat4::identity());
}

#[test]
fn concat_deconcat() {
    let lhs = posed();
    let rhs = SpatialPose {
        rotate: glm::vec4(5.0, 5.0, -10.0, 0.0),
        scale: glm::vec4(4.0, 2.0, 0.5, 1.0),
        translate: glm::vec4(-1.0, 1.0, 0.5, 0.0),
        ..SpatialPose::identity()
    };
    let mut layered = SpatialPose::identity();
    layered.concat(&lhs, &rhs);
    check_vec4(&layered.rotate, &glm::vec4(25.0, -30.0, 50.0, 0.0));
    check_vec4(&layered.scale, &glm::vec4(8.0, 1.0, 0.75, 1.0));
    check_vec4(&layered.translate, &glm::vec4(0.0, -1.0, 3.5, 0.0));

    let mut back = SpatialPose::identity();
    back.deconcat(&layered, &rhs);
    check_vec4(&back.rotate, &lhs.rotate);
    check_vec4(&back.scale, &lhs.scale);
    check_vec4(&back.translate, &lhs.translate);
}

#[test]
fn lerp() {
    let a = SpatialPose::identity();
    let b = posed();
    let mut out = SpatialPose::identity();
    out.lerp(&a, &b, 0.25);
    check_vec4(&out.rotate, &glm::vec4(5.0, -8.75, 15.0, 0.0));
    check_vec4(&out.scale, &glm::vec4(1.25, 0.875, 1.125, 1.0));
    check_vec4(&out.translate, &glm::vec4(0.25, -0.5, 0.75, 0.0));

    out.lerp(&a, &b, 1.0);
    check_vec4(&out.rotate, &b.rotate);
}
