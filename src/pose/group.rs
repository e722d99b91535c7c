use super::types::{slice_pool, HierarchyPose};
use crate::{
    arm_error::ArmError,
    hierarchy::Hierarchy,
    spatial_pose::{EulerOrder, PoseChannel, SpatialPose},
};
use log::debug;
use std::sync::Arc;

/// A set of hierarchy poses sharing one pool
///
/// The pool holds `hpose_count * num_nodes` poses and is sliced into
/// `hpose_count` views. Channel and Euler order are stored once per node and
/// apply to every pose in the group. A default group is uninitialized until
/// `create` is called.
#[derive(Clone, Debug, Default)]
pub struct HierarchyPoseGroup {
    hierarchy: Option<Arc<Hierarchy>>,
    hposes: Vec<HierarchyPose>,
    pool: Vec<SpatialPose>,
    channels: Vec<PoseChannel>,
    orders: Vec<EulerOrder>,
}

impl HierarchyPoseGroup {
    /// Creates an initialized group
    ///
    /// # Errors
    /// See `create`
    pub fn new(
        hierarchy: &Arc<Hierarchy>,
        hpose_count: usize,
    ) -> Result<Self, ArmError> {
        let mut group = Self::default();
        group.create(hierarchy, hpose_count)?;
        Ok(group)
    }

    /// Allocates the pool for `hpose_count` hierarchy poses, all set to
    /// identity, and returns the total pose count
    ///
    /// # Errors
    /// Returns `ArmError::AlreadyInitialized` if the group already holds poses
    /// or `ArmError::InvalidCount` if `hpose_count` is zero
    pub fn create(
        &mut self,
        hierarchy: &Arc<Hierarchy>,
        hpose_count: usize,
    ) -> Result<usize, ArmError> {
        if self.hierarchy.is_some() {
            return Err(ArmError::AlreadyInitialized);
        }
        let node_count = hierarchy.num_nodes();
        if hpose_count == 0 || node_count == 0 {
            return Err(ArmError::InvalidCount(hpose_count));
        }
        let pose_count = hpose_count
            .checked_mul(node_count)
            .ok_or(ArmError::InvalidCount(hpose_count))?;
        self.pool = vec![SpatialPose::identity(); pose_count];
        self.hposes = slice_pool(hpose_count, node_count);
        self.channels = vec![PoseChannel::empty(); node_count];
        self.orders = vec![EulerOrder::default(); node_count];
        self.hierarchy = Some(Arc::clone(hierarchy));
        debug!("Created pose group of {hpose_count} x {node_count} poses");
        Ok(pose_count)
    }

    /// Drops the pool and returns how many poses it held
    ///
    /// # Errors
    /// Returns `ArmError::NotInitialized` if there was nothing to release
    pub fn release(&mut self) -> Result<usize, ArmError> {
        if self.hierarchy.is_none() {
            return Err(ArmError::NotInitialized);
        }
        let pose_count = self.pool.len();
        *self = Self::default();
        debug!("Released pose group of {pose_count} poses");
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
    pub fn hpose_count(&self) -> usize {
        self.hposes.len()
    }

    #[must_use]
    pub fn pose_count(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn hposes(&self) -> &[HierarchyPose] {
        &self.hposes
    }

    /// The whole pool in layout order
    #[must_use]
    pub fn poses(&self) -> &[SpatialPose] {
        &self.pool
    }

    #[must_use]
    pub fn poses_mut(&mut self) -> &mut [SpatialPose] {
        &mut self.pool
    }

    /// Poses of one hierarchy pose, one per node
    #[must_use]
    pub fn hpose(&self, hpose_index: usize) -> Option<&[SpatialPose]> {
        let view = self.hposes.get(hpose_index)?;
        self.pool.get(view.range())
    }

    #[must_use]
    pub fn hpose_mut(
        &mut self,
        hpose_index: usize,
    ) -> Option<&mut [SpatialPose]> {
        let view = self.hposes.get(hpose_index)?;
        self.pool.get_mut(view.range())
    }

    #[must_use]
    pub fn channels(&self) -> &[PoseChannel] {
        &self.channels
    }

    #[must_use]
    pub fn orders(&self) -> &[EulerOrder] {
        &self.orders
    }

    /// # Errors
    /// Returns `ArmError::IndexOutOfRange` for an unknown node
    pub fn set_channel(
        &mut self,
        node_index: usize,
        channel: PoseChannel,
    ) -> Result<usize, ArmError> {
        let slot = self
            .channels
            .get_mut(node_index)
            .ok_or(ArmError::IndexOutOfRange(node_index))?;
        *slot = channel;
        Ok(node_index)
    }

    /// # Errors
    /// Returns `ArmError::IndexOutOfRange` for an unknown node
    pub fn set_order(
        &mut self,
        node_index: usize,
        order: EulerOrder,
    ) -> Result<usize, ArmError> {
        let slot = self
            .orders
            .get_mut(node_index)
            .ok_or(ArmError::IndexOutOfRange(node_index))?;
        *slot = order;
        Ok(node_index)
    }

    /// Replaces the per-node channels and orders, as when loading from a file
    ///
    /// # Errors
    /// Returns `ArmError::CountMismatch` if either list is not one per node
    pub fn set_channels_and_orders(
        &mut self,
        channels: Vec<PoseChannel>,
        orders: Vec<EulerOrder>,
    ) -> Result<usize, ArmError> {
        if channels.len() != self.channels.len()
            || orders.len() != self.orders.len()
        {
            return Err(ArmError::CountMismatch);
        }
        self.channels = channels;
        self.orders = orders;
        Ok(self.channels.len())
    }

    /// Offset of the first pose of a hierarchy pose within the pool
    #[must_use]
    pub fn pose_offset_index(&self, hpose_index: usize) -> Option<usize> {
        self.hposes.get(hpose_index).map(|view| view.hpose_index)
    }

    /// Offset of one node's pose within the pool
    #[must_use]
    pub fn node_pose_offset_index(
        &self,
        hpose_index: usize,
        node_index: usize,
    ) -> Option<usize> {
        self.hposes
            .get(hpose_index)
            .and_then(|view| view.node_offset(node_index))
    }

    /// Sets every pose in the pool back to identity
    pub fn reset_all(&mut self) -> usize {
        super::ops::reset(&mut self.pool)
    }
}
