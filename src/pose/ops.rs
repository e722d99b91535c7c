//! Operations over whole hierarchy poses. Every slice passed to one call must
//! hold the same number of poses, one per node, and the count of poses
//! processed is returned.
use crate::{
    arm_error::ArmError,
    spatial_pose::{EulerOrder, PoseChannel, SpatialPose},
};
use itertools::izip;

fn same_len(a: usize, b: usize) -> Result<(), ArmError> {
    if a == b {
        Ok(())
    } else {
        Err(ArmError::CountMismatch)
    }
}

pub fn reset(poses: &mut [SpatialPose]) -> usize {
    poses.iter_mut().for_each(SpatialPose::reset);
    poses.len()
}

/// # Errors
/// Returns `ArmError::CountMismatch` if the slices differ in length
pub fn copy(
    out: &mut [SpatialPose],
    input: &[SpatialPose],
) -> Result<usize, ArmError> {
    same_len(out.len(), input.len())?;
    for (o, i) in out.iter_mut().zip(input) {
        o.copy(i);
    }
    Ok(out.len())
}

/// # Errors
/// Returns `ArmError::CountMismatch` if the slices differ in length
pub fn concat(
    out: &mut [SpatialPose],
    lhs: &[SpatialPose],
    rhs: &[SpatialPose],
) -> Result<usize, ArmError> {
    same_len(out.len(), lhs.len())?;
    same_len(out.len(), rhs.len())?;
    for (o, l, r) in izip!(out.iter_mut(), lhs, rhs) {
        o.concat(l, r);
    }
    Ok(out.len())
}

/// # Errors
/// Returns `ArmError::CountMismatch` if the slices differ in length
pub fn deconcat(
    out: &mut [SpatialPose],
    lhs: &[SpatialPose],
    rhs: &[SpatialPose],
) -> Result<usize, ArmError> {
    same_len(out.len(), lhs.len())?;
    same_len(out.len(), rhs.len())?;
    for (o, l, r) in izip!(out.iter_mut(), lhs, rhs) {
        o.deconcat(l, r);
    }
    Ok(out.len())
}

/// # Errors
/// Returns `ArmError::CountMismatch` if the slices differ in length
pub fn lerp(
    out: &mut [SpatialPose],
    pose0: &[SpatialPose],
    pose1: &[SpatialPose],
    u: f32,
) -> Result<usize, ArmError> {
    same_len(out.len(), pose0.len())?;
    same_len(out.len(), pose1.len())?;
    for (o, p0, p1) in izip!(out.iter_mut(), pose0, pose1) {
        o.lerp(p0, p1, u);
    }
    Ok(out.len())
}

/// Converts each pose with its node's channel and Euler order
///
/// # Errors
/// Returns `ArmError::CountMismatch` if the slices differ in length
pub fn convert(
    poses: &mut [SpatialPose],
    channels: &[PoseChannel],
    orders: &[EulerOrder],
) -> Result<usize, ArmError> {
    same_len(poses.len(), channels.len())?;
    same_len(poses.len(), orders.len())?;
    for (pose, channel, order) in izip!(poses.iter_mut(), channels, orders) {
        pose.convert(*channel, *order);
    }
    Ok(poses.len())
}

/// Restores each pose with its node's channel and Euler order
///
/// # Errors
/// Returns `ArmError::CountMismatch` if the slices differ in length
pub fn restore(
    poses: &mut [SpatialPose],
    channels: &[PoseChannel],
    orders: &[EulerOrder],
) -> Result<usize, ArmError> {
    same_len(poses.len(), channels.len())?;
    same_len(poses.len(), orders.len())?;
    for (pose, channel, order) in izip!(poses.iter_mut(), channels, orders) {
        pose.restore(*channel, *order);
    }
    Ok(poses.len())
}
