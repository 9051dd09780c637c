use glam::IVec3;

use crate::core::TreeConfig;
use crate::voxel::VoxelValue;

use super::{InternalNode, LeafNode};

/// A tree node below the root: either an expanded branching node or a dense
/// leaf. The variant set is closed; a node's origin and level are fixed at
/// construction.
#[derive(Clone, PartialEq, Debug)]
pub enum Node<V> {
    Internal(InternalNode<V>),
    Leaf(LeafNode<V>),
}

impl<V: VoxelValue> Node<V> {
    #[must_use]
    #[inline(always)]
    pub fn origin(&self) -> IVec3 {
        match self {
            Node::Internal(node) => node.origin(),
            Node::Leaf(leaf) => leaf.origin(),
        }
    }

    /// Level of this node; leaves are level 0.
    #[must_use]
    #[inline(always)]
    pub fn level(&self) -> u32 {
        match self {
            Node::Internal(node) => node.level(),
            Node::Leaf(_) => 0,
        }
    }
}

/// Creates a child node at `level` with no active entries.
pub(crate) fn empty_child<V: VoxelValue>(
    config: &TreeConfig,
    level: u32,
    origin: IVec3,
    background: V,
) -> Node<V> {
    if level == 0 {
        Node::Leaf(LeafNode::new(origin, config.leaf_log2(), background))
    } else {
        Node::Internal(InternalNode::new(config, level, origin))
    }
}

/// Creates a child node at `level` representing a constant tile expanded in
/// place: every entry carries `value` with the tile's active state.
pub(crate) fn uniform_child<V: VoxelValue>(
    config: &TreeConfig,
    level: u32,
    origin: IVec3,
    value: V,
    active: bool,
) -> Node<V> {
    if level == 0 {
        Node::Leaf(LeafNode::filled(origin, config.leaf_log2(), value, active))
    } else {
        Node::Internal(InternalNode::uniform(config, level, origin, value, active))
    }
}
