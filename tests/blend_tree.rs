//! Tests for blend operations and blend trees

use armature::{
    blend::{BlendOpSet, BlendTree, LinearBlend, NearestBlend, SphericalBlend},
    hierarchy::Hierarchy,
    spatial_pose::{EulerOrder, SpatialPose},
    ArmError,
};
use nalgebra_glm as glm;
use std::sync::Arc;

const EPSILON: f32 = 0.0005_f32;

fn check_vec4(a: &glm::Vec4, b: &glm::Vec4) {
    let c = glm::equal_eps(a, b, EPSILON);
    assert!(c.x && c.y && c.z && c.w, "{a:?} != {b:?}");
}

/// Two blends where the second one consumes the first one's output
fn tree() -> BlendTree {
    let mut descriptor = Hierarchy::new(2, &[]).unwrap();
    descriptor.set_node(0, None, "walk_run").unwrap();
    descriptor.set_node(1, Some(0), "lean").unwrap();
    BlendTree::new(descriptor)
}

fn poses() -> Vec<SpatialPose> {
    let walk = SpatialPose {
        translate: glm::vec4(0.0, 0.0, 1.0, 0.0),
        scale: glm::vec4(1.0, 1.0, 1.0, 1.0),
        ..SpatialPose::identity()
    };
    let run = SpatialPose {
        rotate: glm::vec4(0.0, 0.0, 90.0, 0.0),
        translate: glm::vec4(0.0, 0.0, 3.0, 0.0),
        scale: glm::vec4(2.0, 2.0, 2.0, 1.0),
        ..SpatialPose::identity()
    };
    vec![walk, run, SpatialPose::identity(), SpatialPose::identity()]
}

#[test]
fn configure() {
    let mut tree = tree();
    assert_eq!(tree.nodes().len(), 2);
    assert_eq!(tree.descriptor().node_index("lean"), Some(1));
    assert!(tree.nodes().iter().all(|n| n.op_set.is_none()));

    assert_eq!(
        tree.configure_node(0, 2, 0, 1, Arc::new(LinearBlend)).unwrap(),
        0
    );
    let node = tree.node(0).unwrap();
    assert_eq!(node.out, 2);
    assert_eq!(node.controls.as_slice(), &[0, 1]);
    assert_eq!(node.inputs.as_slice(), &[0.5]);

    assert!(matches!(
        tree.configure_node(2, 2, 0, 1, Arc::new(LinearBlend)),
        Err(ArmError::IndexOutOfRange(2))
    ));
}

#[test]
fn execute_midpoint() {
    let mut tree = tree();
    tree.configure_node(0, 2, 0, 1, Arc::new(LinearBlend)).unwrap();
    let mut poses = poses();
    // The unconfigured second node is skipped
    assert_eq!(tree.execute(&mut poses).unwrap(), 1);
    check_vec4(&poses[2].rotate, &glm::vec4(0.0, 0.0, 45.0, 0.0));
    check_vec4(&poses[2].translate, &glm::vec4(0.0, 0.0, 2.0, 0.0));
    check_vec4(&poses[2].scale, &glm::vec4(1.5, 1.5, 1.5, 1.0));
    assert_eq!(poses[3], SpatialPose::identity());
}

#[test]
fn nodes_run_in_order() {
    let mut tree = tree();
    tree.configure_node(0, 2, 0, 1, Arc::new(LinearBlend)).unwrap();
    tree.configure_node(1, 3, 2, 1, Arc::new(LinearBlend)).unwrap();
    tree.set_inputs(1, &[0.0]).unwrap();
    let mut poses = poses();
    assert_eq!(tree.execute(&mut poses).unwrap(), 2);
    check_vec4(&poses[3].translate, &poses[2].translate);
    check_vec4(&poses[3].scale, &poses[2].scale);
}

#[test]
fn spherical_rotation() {
    let mut tree = tree();
    let op_set = Arc::new(SphericalBlend {
        order: EulerOrder::Xyz,
    });
    tree.configure_node(0, 2, 0, 1, op_set.clone()).unwrap();
    let mut poses = poses();
    tree.execute(&mut poses).unwrap();
    check_vec4(&poses[2].rotate, &glm::vec4(0.0, 0.0, 45.0, 0.0));
    check_vec4(&poses[2].translate, &glm::vec4(0.0, 0.0, 2.0, 0.0));

    // Across the +-180 seam the short way round stays near 180
    let near = op_set.blend_rotate(
        &[glm::vec4(0.0, 0.0, 170.0, 0.0), glm::vec4(0.0, 0.0, -170.0, 0.0)],
        &[0.25],
    );
    assert!(near.z.abs() > 174.0, "{near:?}");
}

#[test]
fn nearest_control() {
    let controls = [
        glm::vec4(1.0, 0.0, 0.0, 0.0),
        glm::vec4(2.0, 0.0, 0.0, 0.0),
        glm::vec4(3.0, 0.0, 0.0, 0.0),
    ];
    assert_eq!(NearestBlend.blend_translate(&controls, &[0.2]), controls[0]);
    assert_eq!(NearestBlend.blend_translate(&controls, &[0.3]), controls[1]);
    assert_eq!(NearestBlend.blend_translate(&controls, &[1.0]), controls[2]);
}

#[test]
fn many_controls() {
    let mut tree = tree();
    tree.configure_node(0, 3, 0, 1, Arc::new(LinearBlend)).unwrap();
    assert_eq!(tree.set_controls(0, &[0, 1, 2]).unwrap(), 3);
    assert_eq!(tree.set_inputs(0, &[0.75]).unwrap(), 1);
    let mut poses = poses();
    poses[2].translate = glm::vec4(0.0, 0.0, 5.0, 0.0);
    tree.execute(&mut poses).unwrap();
    check_vec4(&poses[3].translate, &glm::vec4(0.0, 0.0, 4.0, 0.0));

    assert!(matches!(
        tree.set_controls(0, &[0; 17]),
        Err(ArmError::InvalidCount(17))
    ));
    assert!(tree.set_inputs(0, &[0.5; 9]).is_err());
    assert!(tree.set_inputs(5, &[0.5]).is_err());
    assert_eq!(tree.node(0).unwrap().controls.len(), 3);
}

#[test]
fn bad_pose_index_writes_nothing() {
    let mut tree = tree();
    tree.configure_node(0, 2, 0, 1, Arc::new(LinearBlend)).unwrap();
    tree.configure_node(1, 3, 2, 9, Arc::new(LinearBlend)).unwrap();
    let mut poses = poses();
    let before = poses.clone();
    assert!(matches!(
        tree.execute(&mut poses),
        Err(ArmError::IndexOutOfRange(9))
    ));
    assert_eq!(poses, before);
}
