use crate::arm_error::ArmError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HierarchyNode {
    pub name: String,
    pub index: usize,
    pub parent_index: Option<usize>, // None for a root
}

/// Ordered tree of named nodes
///
/// A node's parent always has a lower index than the node itself, so walking
/// the nodes in index order visits every parent before its children. The node
/// count is fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
}

fn default_name(index: usize) -> String {
    format!("node_{index}")
}

impl Hierarchy {
    /// Creates a hierarchy of `count` root nodes. Names are taken from `names`
    /// where available and non-empty, otherwise a default name is generated.
    ///
    /// # Errors
    /// Returns `ArmError::InvalidCount` if `count` is zero
    pub fn new(count: usize, names: &[&str]) -> Result<Self, ArmError> {
        if count == 0 {
            return Err(ArmError::InvalidCount(count));
        }
        let nodes = (0..count)
            .map(|index| {
                let name = names
                    .get(index)
                    .filter(|name| !name.is_empty())
                    .map_or_else(|| default_name(index), |name| (*name).to_owned());
                HierarchyNode {
                    name,
                    index,
                    parent_index: None,
                }
            })
            .collect();
        Ok(Self { nodes })
    }

    /// Creates a hierarchy from complete node records, such as those read
    /// from a file
    ///
    /// # Errors
    /// Returns an error if the list is empty, a node's `index` does not match
    /// its position or a parent does not precede its child
    pub fn from_nodes(nodes: Vec<HierarchyNode>) -> Result<Self, ArmError> {
        if nodes.is_empty() {
            return Err(ArmError::InvalidCount(0));
        }
        for (position, node) in nodes.iter().enumerate() {
            if node.index != position {
                return Err(ArmError::IndexOutOfRange(node.index));
            }
            if let Some(parent) = node.parent_index {
                if parent >= node.index {
                    return Err(ArmError::ParentOrder {
                        index: node.index,
                        parent,
                    });
                }
            }
        }
        Ok(Self { nodes })
    }

    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, index: usize) -> Option<&HierarchyNode> {
        self.nodes.get(index)
    }

    #[must_use]
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|node| node.parent_index)
    }

    /// Sets the parent and name of a node
    ///
    /// # Errors
    /// Returns an error without modifying the node if `index` is out of range
    /// or `parent_index` is not lower than `index`
    pub fn set_node(
        &mut self,
        index: usize,
        parent_index: Option<usize>,
        name: &str,
    ) -> Result<usize, ArmError> {
        if index >= self.nodes.len() {
            return Err(ArmError::IndexOutOfRange(index));
        }
        if let Some(parent) = parent_index {
            if parent >= index {
                return Err(ArmError::ParentOrder { index, parent });
            }
        }
        self.nodes[index] = HierarchyNode {
            name: name.to_owned(),
            index,
            parent_index,
        };
        Ok(index)
    }

    /// Index of the first node with the given name
    #[must_use]
    pub fn node_index(&self, name: &str) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        self.nodes.iter().position(|node| node.name == name)
    }

    #[must_use]
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.name.as_str()).collect()
    }

    /// Prepends `prefix` to every node name and returns the number of nodes
    /// renamed. An empty prefix renames nothing.
    pub fn prefix_node_names(&mut self, prefix: &str) -> usize {
        if prefix.is_empty() {
            return 0;
        }
        for node in &mut self.nodes {
            node.name.insert_str(0, prefix);
        }
        self.nodes.len()
    }

    fn in_range(&self, a: usize, b: usize) -> bool {
        a < self.nodes.len() && b < self.nodes.len()
    }

    /// True if `parent` is the direct parent of `other`
    #[must_use]
    pub fn is_parent(&self, parent: usize, other: usize) -> bool {
        self.in_range(parent, other)
            && self.nodes[other].parent_index == Some(parent)
    }

    /// True if `child` is a direct child of `other`
    #[must_use]
    pub fn is_child(&self, child: usize, other: usize) -> bool {
        self.is_parent(other, child)
    }

    /// True if both nodes have the same parent. Roots are siblings of each
    /// other.
    #[must_use]
    pub fn is_sibling(&self, sibling: usize, other: usize) -> bool {
        self.in_range(sibling, other)
            && self.nodes[sibling].parent_index
                == self.nodes[other].parent_index
    }

    /// True if `ancestor` is reached by walking up the parents of `other`
    #[must_use]
    pub fn is_ancestor(&self, ancestor: usize, other: usize) -> bool {
        if !self.in_range(ancestor, other) {
            return false;
        }
        let mut current = self.nodes[other].parent_index;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent].parent_index;
        }
        false
    }

    /// True if `descendant` is reached by walking down from `other`
    #[must_use]
    pub fn is_descendant(&self, descendant: usize, other: usize) -> bool {
        self.is_ancestor(other, descendant)
    }
}
