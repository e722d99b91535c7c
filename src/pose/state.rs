use super::{
    ops,
    types::{slice_pool, HierarchyPose},
    HierarchyPoseGroup,
};
use crate::{
    arm_error::ArmError,
    hierarchy::Hierarchy,
    keyframe::{ClipController, ClipPool},
    spatial_pose::SpatialPose,
};
use log::debug;
use nalgebra_glm as glm;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::sync::Arc;

/// The six pose channels of a hierarchy state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateChannel {
    /// Active animation pose, layered onto a base pose
    AnimPose,
    /// Node relative to its parent
    LocalSpace,
    /// Node relative to the root's parent
    ObjectSpace,
    /// Parent relative to the node
    LocalSpaceInv,
    /// Root's parent relative to the node
    ObjectSpaceInv,
    /// Transform from the bind pose to the current pose, for skinning
    ObjectSpaceBindToCurrent,
}

impl StateChannel {
    pub const ALL: [Self; 6] = [
        Self::AnimPose,
        Self::LocalSpace,
        Self::ObjectSpace,
        Self::LocalSpaceInv,
        Self::ObjectSpaceInv,
        Self::ObjectSpaceBindToCurrent,
    ];

    const fn slot(self) -> usize {
        match self {
            Self::AnimPose => 0,
            Self::LocalSpace => 1,
            Self::ObjectSpace => 2,
            Self::LocalSpaceInv => 3,
            Self::ObjectSpaceInv => 4,
            Self::ObjectSpaceBindToCurrent => 5,
        }
    }
}

/// Live runtime poses for one animated instance of a hierarchy
///
/// All six channels are sliced from one pool of `6 * num_nodes` poses that is
/// never resized once created. A default state is uninitialized and all of its
/// channels are empty.
#[derive(Clone, Debug, Default)]
pub struct HierarchyState {
    hierarchy: Option<Arc<Hierarchy>>,
    hposes: Vec<HierarchyPose>,
    pool: Vec<SpatialPose>,
}

impl HierarchyState {
    /// Creates an initialized state
    ///
    /// # Errors
    /// See `create`
    pub fn new(hierarchy: &Arc<Hierarchy>) -> Result<Self, ArmError> {
        let mut state = Self::default();
        state.create(hierarchy)?;
        Ok(state)
    }

    /// Allocates the six channels, all set to identity, and returns the total
    /// pose count
    ///
    /// # Errors
    /// Returns `ArmError::AlreadyInitialized` if the state already holds poses
    pub fn create(
        &mut self,
        hierarchy: &Arc<Hierarchy>,
    ) -> Result<usize, ArmError> {
        if self.hierarchy.is_some() {
            return Err(ArmError::AlreadyInitialized);
        }
        let node_count = hierarchy.num_nodes();
        if node_count == 0 {
            return Err(ArmError::InvalidCount(node_count));
        }
        let channel_count = StateChannel::ALL.len();
        self.pool = vec![SpatialPose::identity(); channel_count * node_count];
        self.hposes = slice_pool(channel_count, node_count);
        self.hierarchy = Some(Arc::clone(hierarchy));
        debug!("Created hierarchy state for {node_count} nodes");
        Ok(self.pool.len())
    }

    /// # Errors
    /// Returns `ArmError::NotInitialized` if there was nothing to release
    pub fn release(&mut self) -> Result<usize, ArmError> {
        if self.hierarchy.is_none() {
            return Err(ArmError::NotInitialized);
        }
        let pose_count = self.pool.len();
        *self = Self::default();
        Ok(pose_count)
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.hierarchy.is_some()
    }

    #[must_use]
    pub const fn hierarchy(&self) -> Option<&Arc<Hierarchy>> {
        self.hierarchy.as_ref()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.hierarchy.as_ref().map_or(0, |h| h.num_nodes())
    }

    /// True if both refer to the very same hierarchy
    #[must_use]
    pub fn shares_hierarchy(&self, other: Option<&Arc<Hierarchy>>) -> bool {
        match (&self.hierarchy, other) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    #[must_use]
    pub fn pose(&self, channel: StateChannel) -> &[SpatialPose] {
        self.hposes
            .get(channel.slot())
            .and_then(|view| self.pool.get(view.range()))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn pose_mut(&mut self, channel: StateChannel) -> &mut [SpatialPose] {
        match self.hposes.get(channel.slot()) {
            Some(view) => self.pool.get_mut(view.range()).unwrap_or_default(),
            None => &mut [],
        }
    }

    /// Borrows one channel for reading and a different one for writing
    #[must_use]
    pub fn split(
        &mut self,
        read: StateChannel,
        write: StateChannel,
    ) -> Option<(&[SpatialPose], &mut [SpatialPose])> {
        let r = *self.hposes.get(read.slot())?;
        let w = *self.hposes.get(write.slot())?;
        if r.hpose_index < w.hpose_index {
            let (head, tail) = self.pool.split_at_mut(w.hpose_index);
            Some((&head[r.range()], &mut tail[..w.node_count]))
        } else if r.hpose_index > w.hpose_index {
            let (head, tail) = self.pool.split_at_mut(r.hpose_index);
            Some((&tail[..r.node_count], &mut head[w.range()]))
        } else {
            None
        }
    }

    /// Offset of a channel's first pose within the pool
    #[must_use]
    pub fn pose_offset_index(&self, channel: StateChannel) -> Option<usize> {
        self.hposes.get(channel.slot()).map(|view| view.hpose_index)
    }

    /// Offset of one node's pose in a channel within the pool
    #[must_use]
    pub fn node_pose_offset_index(
        &self,
        channel: StateChannel,
        node_index: usize,
    ) -> Option<usize> {
        self.hposes
            .get(channel.slot())
            .and_then(|view| view.node_offset(node_index))
    }

    /// The whole pool, all channels in `StateChannel::ALL` order
    pub(crate) fn pool_mut(&mut self) -> &mut [SpatialPose] {
        &mut self.pool
    }

    /// Sets every channel back to identity
    pub fn reset_all(&mut self) -> usize {
        ops::reset(&mut self.pool)
    }

    fn invert(
        &mut self,
        src: StateChannel,
        dst: StateChannel,
    ) -> Result<usize, ArmError> {
        let (src, dst) =
            self.split(src, dst).ok_or(ArmError::NotInitialized)?;

        #[cfg(feature = "rayon")]
        dst.par_iter_mut().zip(src.par_iter()).for_each(|(d, s)| {
            d.transform_mat = glm::inverse(&s.transform_mat);
        });

        #[cfg(not(feature = "rayon"))]
        for (d, s) in dst.iter_mut().zip(src) {
            d.transform_mat = glm::inverse(&s.transform_mat);
        }

        Ok(dst.len())
    }

    /// Inverts every local-space matrix into the local-space inverse channel
    ///
    /// # Errors
    /// Returns `ArmError::NotInitialized` for an uninitialized state
    pub fn update_local_inverse(&mut self) -> Result<usize, ArmError> {
        self.invert(StateChannel::LocalSpace, StateChannel::LocalSpaceInv)
    }

    /// Inverts every object-space matrix into the object-space inverse
    /// channel
    ///
    /// # Errors
    /// Returns `ArmError::NotInitialized` for an uninitialized state
    pub fn update_object_inverse(&mut self) -> Result<usize, ArmError> {
        self.invert(StateChannel::ObjectSpace, StateChannel::ObjectSpaceInv)
    }

    /// Computes the transform from the bind pose in `bind` to the current
    /// object-space pose for every node. `bind` must have current object-space
    /// inverse matrices.
    ///
    /// # Errors
    /// Returns an error if either state is uninitialized or the states use
    /// different hierarchies
    pub fn update_object_bind_to_current(
        &mut self,
        bind: &Self,
    ) -> Result<usize, ArmError> {
        if !self.is_initialized() || !bind.is_initialized() {
            return Err(ArmError::NotInitialized);
        }
        if !self.shares_hierarchy(bind.hierarchy()) {
            return Err(ArmError::HierarchyMismatch);
        }
        let bind_inv = bind.pose(StateChannel::ObjectSpaceInv);
        let (object, out) = self
            .split(
                StateChannel::ObjectSpace,
                StateChannel::ObjectSpaceBindToCurrent,
            )
            .ok_or(ArmError::NotInitialized)?;
        for (o, (current, inv)) in
            out.iter_mut().zip(object.iter().zip(bind_inv))
        {
            o.transform_mat = current.transform_mat * inv.transform_mat;
        }
        Ok(out.len())
    }

    /// Interpolates the animation pose between the two hierarchy poses in
    /// `group` that the controller's current keyframe samples refer to. A
    /// sample's index is used as the index of its hierarchy pose.
    ///
    /// # Errors
    /// Returns an error if the group uses another hierarchy or the keyframe or
    /// its samples have no matching hierarchy pose
    pub fn sample_anim_pose(
        &mut self,
        group: &HierarchyPoseGroup,
        clip_pool: &ClipPool,
        controller: &ClipController,
    ) -> Result<usize, ArmError> {
        if !self.is_initialized() {
            return Err(ArmError::NotInitialized);
        }
        if !self.shares_hierarchy(group.hierarchy()) {
            return Err(ArmError::HierarchyMismatch);
        }
        let keyframe_index = controller.keyframe_index();
        let keyframe = clip_pool
            .keyframe(keyframe_index)
            .ok_or(ArmError::IndexOutOfRange(keyframe_index))?;
        let pose0 = group
            .hpose(keyframe.sample_index0)
            .ok_or(ArmError::IndexOutOfRange(keyframe.sample_index0))?;
        let pose1 = group
            .hpose(keyframe.sample_index1)
            .ok_or(ArmError::IndexOutOfRange(keyframe.sample_index1))?;
        ops::lerp(
            self.pose_mut(StateChannel::AnimPose),
            pose0,
            pose1,
            controller.keyframe_param() as f32,
        )
    }

    /// Matrices of one channel in node order, ready for upload
    #[must_use]
    pub fn matrices(&self, channel: StateChannel) -> Vec<glm::Mat4> {
        self.pose(channel).iter().map(|p| p.transform_mat).collect()
    }

    /// Matrices of one channel as raw column major `f32` bytes
    #[must_use]
    pub fn matrix_bytes(&self, channel: StateChannel) -> Vec<u8> {
        let matrices = self.matrices(channel);
        bytemuck::cast_slice::<glm::Mat4, u8>(&matrices).to_vec()
    }
}
