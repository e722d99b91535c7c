//! Forward and inverse kinematics over a `HierarchyState`, and the per-tick
//! pipelines built from them
use crate::{
    arm_error::ArmError,
    hierarchy::Hierarchy,
    pose::{ops, HierarchyPoseGroup, HierarchyState, StateChannel},
};
use log::debug;
use nalgebra_glm as glm;
use std::{ops::Range, sync::Arc};

// Pool offsets of the channels the solvers touch
struct Offsets {
    local: usize,
    object: usize,
    object_inv: usize,
}

fn solver_setup(
    state: &HierarchyState,
    first: usize,
    count: usize,
) -> Result<(Arc<Hierarchy>, Offsets, Range<usize>), ArmError> {
    let hierarchy = state.hierarchy().ok_or(ArmError::NotInitialized)?;
    let node_count = hierarchy.num_nodes();
    if first >= node_count || count == 0 || count > node_count - first {
        return Err(ArmError::InvalidRange { first, count });
    }
    let offset = |channel| {
        state
            .pose_offset_index(channel)
            .ok_or(ArmError::NotInitialized)
    };
    let offsets = Offsets {
        local: offset(StateChannel::LocalSpace)?,
        object: offset(StateChannel::ObjectSpace)?,
        object_inv: offset(StateChannel::ObjectSpaceInv)?,
    };
    Ok((Arc::clone(hierarchy), offsets, first..first + count))
}

/// Computes object-space matrices from local-space matrices for the nodes
/// `first..first + count`. Parents outside the range must already be solved.
/// Returns the number of nodes solved.
///
/// # Errors
/// Returns `ArmError::NotInitialized` for an uninitialized state or
/// `ArmError::InvalidRange` if the range is empty or runs past the last node
pub fn solve_forward_partial(
    state: &mut HierarchyState,
    first: usize,
    count: usize,
) -> Result<usize, ArmError> {
    let (hierarchy, at, range) = solver_setup(state, first, count)?;
    let pool = state.pool_mut();
    for node in hierarchy.nodes()[range].iter() {
        let local = pool[at.local + node.index].transform_mat;
        pool[at.object + node.index].transform_mat = match node.parent_index {
            Some(parent) => pool[at.object + parent].transform_mat * local,
            None => local,
        };
    }
    Ok(count)
}

/// Computes local-space matrices from object-space matrices for the nodes
/// `first..first + count`. The object-space inverse of every parent must be
/// current. Returns the number of nodes solved.
///
/// # Errors
/// Returns `ArmError::NotInitialized` for an uninitialized state or
/// `ArmError::InvalidRange` if the range is empty or runs past the last node
pub fn solve_inverse_partial(
    state: &mut HierarchyState,
    first: usize,
    count: usize,
) -> Result<usize, ArmError> {
    let (hierarchy, at, range) = solver_setup(state, first, count)?;
    let pool = state.pool_mut();
    for node in hierarchy.nodes()[range].iter() {
        let object = pool[at.object + node.index].transform_mat;
        pool[at.local + node.index].transform_mat = match node.parent_index {
            Some(parent) => pool[at.object_inv + parent].transform_mat * object,
            None => object,
        };
    }
    Ok(count)
}

fn check_states(
    active: &HierarchyState,
    base: &HierarchyState,
) -> Result<(), ArmError> {
    if active.is_initialized() && base.is_initialized() {
        Ok(())
    } else {
        Err(ArmError::NotInitialized)
    }
}

fn shares_all(
    active: &HierarchyState,
    base: &HierarchyState,
    group: &HierarchyPoseGroup,
) -> bool {
    active.shares_hierarchy(base.hierarchy())
        && active.shares_hierarchy(group.hierarchy())
}

/// Forward pipeline: layers the active animation pose onto the base local
/// pose, converts the result to matrices and solves object space for the
/// whole hierarchy. Does nothing and returns 0 if the states and group do not
/// share one hierarchy.
///
/// # Errors
/// Returns `ArmError::NotInitialized` if either state is uninitialized
pub fn update_fk(
    active: &mut HierarchyState,
    base: &HierarchyState,
    group: &HierarchyPoseGroup,
) -> Result<usize, ArmError> {
    check_states(active, base)?;
    if !shares_all(active, base, group) {
        debug!("Skipping FK, inputs use different hierarchies");
        return Ok(0);
    }
    let (anim, local) = active
        .split(StateChannel::AnimPose, StateChannel::LocalSpace)
        .ok_or(ArmError::NotInitialized)?;
    ops::concat(local, anim, base.pose(StateChannel::LocalSpace))?;
    ops::convert(local, group.channels(), group.orders())?;
    let node_count = active.node_count();
    solve_forward_partial(active, 0, node_count)
}

/// Inverse pipeline: solves local space from object space for the whole
/// hierarchy, restores the local poses and removes the base local pose to
/// leave the animation pose. Object-space inverses must be current. Does
/// nothing and returns 0 if the states and group do not share one hierarchy.
///
/// # Errors
/// Returns `ArmError::NotInitialized` if either state is uninitialized
pub fn update_ik(
    active: &mut HierarchyState,
    base: &HierarchyState,
    group: &HierarchyPoseGroup,
) -> Result<usize, ArmError> {
    check_states(active, base)?;
    if !shares_all(active, base, group) {
        debug!("Skipping IK, inputs use different hierarchies");
        return Ok(0);
    }
    let node_count = active.node_count();
    let solved = solve_inverse_partial(active, 0, node_count)?;
    ops::restore(
        active.pose_mut(StateChannel::LocalSpace),
        group.channels(),
        group.orders(),
    )?;
    let (local, anim) = active
        .split(StateChannel::LocalSpace, StateChannel::AnimPose)
        .ok_or(ArmError::NotInitialized)?;
    ops::deconcat(anim, local, base.pose(StateChannel::LocalSpace))?;
    Ok(solved)
}

/// Skinning pipeline: refreshes both inverse channels, then the transform
/// from the base state's bind pose to the current pose. The base state's
/// object-space inverse must be current. Does nothing and returns 0 if the
/// states do not share one hierarchy.
///
/// # Errors
/// Returns `ArmError::NotInitialized` if either state is uninitialized
pub fn update_skin(
    active: &mut HierarchyState,
    base: &HierarchyState,
) -> Result<usize, ArmError> {
    check_states(active, base)?;
    if !active.shares_hierarchy(base.hierarchy()) {
        debug!("Skipping skin update, states use different hierarchies");
        return Ok(0);
    }
    active.update_local_inverse()?;
    active.update_object_inverse()?;
    active.update_object_bind_to_current(base)
}

/// Takes one joint's object-space matrix from an external solver and works
/// back to that joint's animation pose. The parent's object-space inverse
/// must be current. Returns the node index.
///
/// # Errors
/// Returns an error if either state is uninitialized, the inputs use
/// different hierarchies or the node is unknown
pub fn resolve_post_ik(
    active: &mut HierarchyState,
    base: &HierarchyState,
    group: &HierarchyPoseGroup,
    node_index: usize,
    object: &glm::Mat4,
) -> Result<usize, ArmError> {
    check_states(active, base)?;
    if !shares_all(active, base, group) {
        return Err(ArmError::HierarchyMismatch);
    }
    if node_index >= active.node_count() {
        return Err(ArmError::IndexOutOfRange(node_index));
    }
    let channel = group.channels()[node_index];
    let order = group.orders()[node_index];

    active.pose_mut(StateChannel::ObjectSpace)[node_index].transform_mat =
        *object;
    active.pose_mut(StateChannel::ObjectSpaceInv)[node_index].transform_mat =
        glm::inverse(object);
    solve_inverse_partial(active, node_index, 1)?;

    let local = &mut active.pose_mut(StateChannel::LocalSpace)[node_index];
    local.restore(channel, order);
    let local = *local;
    let base_local = &base.pose(StateChannel::LocalSpace)[node_index];
    active.pose_mut(StateChannel::AnimPose)[node_index]
        .deconcat(&local, base_local);
    Ok(node_index)
}
