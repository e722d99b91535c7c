use super::op::{BlendOpSet, CONTROL_LIMIT, DEFAULT_INPUT, INPUT_LIMIT};
use crate::{
    arm_error::ArmError, hierarchy::Hierarchy, spatial_pose::SpatialPose,
};
use nalgebra_glm as glm;
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

/// One blend of control poses into an output pose
///
/// Poses are referred to by index into the pose slice given to
/// `BlendTree::execute`. A node without an operation set is skipped.
#[derive(Clone, Debug, Default)]
pub struct BlendNode {
    pub out: usize,
    pub controls: SmallVec<[usize; CONTROL_LIMIT]>,
    pub inputs: SmallVec<[f32; INPUT_LIMIT]>,
    pub op_set: Option<Arc<dyn BlendOpSet>>,
}

impl BlendNode {
    fn check(&self, pose_count: usize) -> Result<(), ArmError> {
        for &index in std::iter::once(&self.out).chain(&self.controls) {
            if index >= pose_count {
                return Err(ArmError::IndexOutOfRange(index));
            }
        }
        Ok(())
    }

    fn gather(
        &self,
        poses: &[SpatialPose],
        field: impl Fn(&SpatialPose) -> glm::Vec4,
    ) -> SmallVec<[glm::Vec4; CONTROL_LIMIT]> {
        self.controls.iter().map(|&c| field(&poses[c])).collect()
    }
}

/// Blend nodes evaluated in index order
///
/// The descriptor hierarchy names the nodes and records which node feeds
/// which. Nodes must be ordered so that a node's controls are written before
/// it runs. Cycles are not detected.
#[derive(Clone, Debug)]
pub struct BlendTree {
    descriptor: Hierarchy,
    nodes: Vec<BlendNode>,
}

impl BlendTree {
    #[must_use]
    pub fn new(descriptor: Hierarchy) -> Self {
        let nodes = vec![BlendNode::default(); descriptor.num_nodes()];
        Self { descriptor, nodes }
    }

    #[must_use]
    pub const fn descriptor(&self) -> &Hierarchy {
        &self.descriptor
    }

    #[must_use]
    pub fn nodes(&self) -> &[BlendNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, node_index: usize) -> Option<&BlendNode> {
        self.nodes.get(node_index)
    }

    fn node_mut(&mut self, node_index: usize) -> Result<&mut BlendNode, ArmError> {
        self.nodes
            .get_mut(node_index)
            .ok_or(ArmError::IndexOutOfRange(node_index))
    }

    /// Makes a node blend two poses into `out` with a single input of 0.5
    ///
    /// # Errors
    /// Returns `ArmError::IndexOutOfRange` for an unknown node
    pub fn configure_node(
        &mut self,
        node_index: usize,
        out: usize,
        pose1: usize,
        pose2: usize,
        op_set: Arc<dyn BlendOpSet>,
    ) -> Result<usize, ArmError> {
        let node = self.node_mut(node_index)?;
        node.out = out;
        node.controls = smallvec![pose1, pose2];
        node.inputs = smallvec![DEFAULT_INPUT];
        node.op_set = Some(op_set);
        Ok(node_index)
    }

    /// Replaces a node's control poses
    ///
    /// # Errors
    /// Returns an error for an unknown node or more than `CONTROL_LIMIT`
    /// controls
    pub fn set_controls(
        &mut self,
        node_index: usize,
        controls: &[usize],
    ) -> Result<usize, ArmError> {
        if controls.len() > CONTROL_LIMIT {
            return Err(ArmError::InvalidCount(controls.len()));
        }
        self.node_mut(node_index)?.controls = SmallVec::from_slice(controls);
        Ok(controls.len())
    }

    /// Replaces a node's scalar inputs
    ///
    /// # Errors
    /// Returns an error for an unknown node or more than `INPUT_LIMIT` inputs
    pub fn set_inputs(
        &mut self,
        node_index: usize,
        inputs: &[f32],
    ) -> Result<usize, ArmError> {
        if inputs.len() > INPUT_LIMIT {
            return Err(ArmError::InvalidCount(inputs.len()));
        }
        self.node_mut(node_index)?.inputs = SmallVec::from_slice(inputs);
        Ok(inputs.len())
    }

    /// Runs every configured node in index order, blending rotation,
    /// translation and scale separately. Returns the number of nodes run.
    ///
    /// # Errors
    /// Returns `ArmError::IndexOutOfRange` if any configured node refers to a
    /// pose outside of `poses`. Nothing is written in that case.
    pub fn execute(&self, poses: &mut [SpatialPose]) -> Result<usize, ArmError> {
        let configured = || self.nodes.iter().filter(|n| n.op_set.is_some());
        for node in configured() {
            node.check(poses.len())?;
        }
        let mut count = 0;
        for node in configured() {
            let Some(op_set) = node.op_set.as_deref() else {
                continue;
            };
            let inputs = node.inputs.as_slice();

            let rotate = node.gather(poses, |p| p.rotate);
            poses[node.out].rotate = op_set.blend_rotate(&rotate, inputs);

            let translate = node.gather(poses, |p| p.translate);
            poses[node.out].translate = op_set.blend_translate(&translate, inputs);

            let scale = node.gather(poses, |p| p.scale);
            poses[node.out].scale = op_set.blend_scale(&scale, inputs);

            count += 1;
        }
        Ok(count)
    }
}
