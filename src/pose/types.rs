use std::ops::Range;

/// View of one hierarchy-shaped pose inside a shared pool. It holds no poses
/// itself, only where they are.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HierarchyPose {
    /// Offset of the pose for node 0 inside the pool
    pub hpose_index: usize,
    pub node_count: usize,
}

impl HierarchyPose {
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.hpose_index..self.hpose_index + self.node_count
    }

    /// Pool offset of the pose for `node_index`
    #[must_use]
    pub const fn node_offset(&self, node_index: usize) -> Option<usize> {
        if node_index < self.node_count {
            Some(self.hpose_index + node_index)
        } else {
            None
        }
    }
}

/// Slices a pool of `count * node_count` poses into `count` views
pub(crate) fn slice_pool(count: usize, node_count: usize) -> Vec<HierarchyPose> {
    (0..count)
        .map(|i| HierarchyPose {
            hpose_index: i * node_count,
            node_count,
        })
        .collect()
}
