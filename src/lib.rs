//! Skeletal animation core
//!
//! A `Hierarchy` describes a skeleton. Poses for it live in pools:
//! `HierarchyPoseGroup` holds authored poses and `HierarchyState` holds the
//! runtime channels of one animated instance. Each tick a `ClipController`
//! advances through a `ClipPool`, the animation pose is sampled from the
//! group and the `kinematics` pipelines turn it into object-space and
//! skinning matrices. `BlendTree` combines poses channel by channel.

pub mod arm_error;
pub mod blend;
pub mod config;
pub mod dualquat;
pub mod hierarchy;
pub mod keyframe;
pub mod kinematics;
pub mod pose;
pub mod rig_file;
pub mod spatial_pose;

// Re-exports
pub use {
    arm_error::{ArmError, ErrorKind},
    blend::{BlendOpSet, BlendTree},
    config::ClipPoolDesc,
    dualquat::DualQuat,
    hierarchy::{Hierarchy, HierarchyNode},
    keyframe::{ClipController, ClipPool},
    pose::{HierarchyPoseGroup, HierarchyState, StateChannel},
    spatial_pose::{EulerOrder, PoseChannel, SpatialPose},
};
