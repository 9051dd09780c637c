//! Topology union across trees.
//!
//! Merging grids starts by making the destination tree's active region the
//! superset of every source's. The union never deactivates anything and
//! never touches the values of entries that were already active; entries it
//! creates carry the destination background as a placeholder until a value
//! pass fills them in.

use std::collections::hash_map::Entry;

use log::trace;

use crate::core::{MergeError, TreeConfig};
use crate::voxel::VoxelValue;

use super::node::uniform_child;
use super::{InternalNode, LeafNode, Node, RootSlot, Slot, Tree};

impl<V: VoxelValue> Tree<V> {
    /// Makes this tree's active topology the union of itself and `src`.
    ///
    /// The result is at least as fine as either input at every coordinate:
    /// a source child node under a destination tile expands the tile, and a
    /// source active tile over a destination child node activates the whole
    /// subtree. The source's values are never read; it may hold a different
    /// value type than the destination.
    ///
    /// # Errors
    /// - [`MergeError::ConfigMismatch`] if the two trees' level
    ///   configurations differ; the destination is untouched.
    pub fn union_topology<S: VoxelValue>(&mut self, src: &Tree<S>) -> Result<(), MergeError> {
        if self.config() != src.config() {
            return Err(MergeError::ConfigMismatch);
        }
        if src.is_empty() {
            trace!("topology union with empty source is a no-op");
            return Ok(());
        }

        let background = self.background();
        let top = self.config().internal_levels();
        let config = src.config().clone();

        for (&origin, src_slot) in src.root().iter() {
            match src_slot {
                RootSlot::Tile { active: false, .. } => {}
                RootSlot::Tile { active: true, .. } => {
                    match self.root_mut().entry(origin) {
                        Entry::Vacant(entry) => {
                            entry.insert(RootSlot::Tile {
                                value: background,
                                active: true,
                            });
                        }
                        Entry::Occupied(entry) => match entry.into_mut() {
                            RootSlot::Tile { active, .. } => *active = true,
                            RootSlot::Node(node) => activate_subtree(node, background),
                        },
                    }
                }
                RootSlot::Node(src_node) => match self.root_mut().entry(origin) {
                    Entry::Vacant(entry) => {
                        entry.insert(RootSlot::Node(Box::new(topology_from(
                            src_node, &config, background,
                        ))));
                    }
                    Entry::Occupied(entry) => {
                        let slot = entry.into_mut();
                        if let RootSlot::Tile { value, active } = slot {
                            let (value, active) = (*value, *active);
                            *slot = RootSlot::Node(Box::new(uniform_child(
                                &config, top, origin, value, active,
                            )));
                        }
                        let RootSlot::Node(dst_node) = slot else {
                            unreachable!()
                        };
                        union_nodes(dst_node, src_node, &config, background);
                    }
                },
            }
        }

        Ok(())
    }
}

/// Unions `src`'s active topology into `dst`. Both nodes cover the same
/// region of trees with equal configurations.
fn union_nodes<V: VoxelValue, S: VoxelValue>(
    dst: &mut Node<V>,
    src: &Node<S>,
    config: &TreeConfig,
    background: V,
) {
    match (dst, src) {
        (Node::Leaf(dst_leaf), Node::Leaf(src_leaf)) => {
            dst_leaf.union_mask(src_leaf.mask());
        }
        (Node::Internal(dst_node), Node::Internal(src_node)) => {
            union_internal(dst_node, src_node, config, background);
        }
        _ => panic!("node level mismatch during topology union"),
    }
}

fn union_internal<V: VoxelValue, S: VoxelValue>(
    dst: &mut InternalNode<V>,
    src: &InternalNode<S>,
    config: &TreeConfig,
    background: V,
) {
    debug_assert_eq!(dst.origin(), src.origin());
    debug_assert_eq!(dst.level(), src.level());

    let level = dst.level();
    for index in 0..dst.slot_count() {
        match src.slot(index) {
            Slot::Empty | Slot::Tile { active: false, .. } => {}
            Slot::Tile { active: true, .. } => match dst.slot_mut(index) {
                slot @ Slot::Empty => {
                    *slot = Slot::Tile {
                        value: background,
                        active: true,
                    };
                }
                Slot::Tile { active, .. } => *active = true,
                Slot::Node(child) => activate_subtree(child, background),
            },
            Slot::Node(src_child) => {
                let origin = dst.origin_of_slot(index);
                let slot = dst.slot_mut(index);
                match slot {
                    Slot::Empty => {
                        *slot = Slot::Node(Box::new(topology_from(
                            src_child, config, background,
                        )));
                    }
                    Slot::Tile { value, active } => {
                        let (value, active) = (*value, *active);
                        let mut expanded = uniform_child(config, level - 1, origin, value, active);
                        union_nodes(&mut expanded, src_child, config, background);
                        *slot = Slot::Node(Box::new(expanded));
                    }
                    Slot::Node(dst_child) => {
                        union_nodes(dst_child, src_child, config, background);
                    }
                }
            }
        }
    }
}

/// Builds a destination node mirroring `src`'s active topology, with every
/// value set to `background`. Inactive source tiles contribute nothing and
/// map to empty slots.
fn topology_from<S: VoxelValue, V: VoxelValue>(
    src: &Node<S>,
    config: &TreeConfig,
    background: V,
) -> Node<V> {
    match src {
        Node::Leaf(src_leaf) => Node::Leaf(LeafNode::with_mask(
            src_leaf.origin(),
            config.leaf_log2(),
            background,
            src_leaf.mask().clone(),
        )),
        Node::Internal(src_node) => {
            let mut node = InternalNode::new(config, src_node.level(), src_node.origin());
            for index in 0..src_node.slot_count() {
                match src_node.slot(index) {
                    Slot::Empty | Slot::Tile { active: false, .. } => {}
                    Slot::Tile { active: true, .. } => {
                        *node.slot_mut(index) = Slot::Tile {
                            value: background,
                            active: true,
                        };
                    }
                    Slot::Node(child) => {
                        *node.slot_mut(index) =
                            Slot::Node(Box::new(topology_from(child, config, background)));
                    }
                }
            }
            Node::Internal(node)
        }
    }
}

/// Activates every entry of a subtree in place, materializing tiles in
/// place of empty slots.
fn activate_subtree<V: VoxelValue>(node: &mut Node<V>, background: V) {
    match node {
        Node::Leaf(leaf) => leaf.activate_all(),
        Node::Internal(inner) => {
            for slot in inner.slots_mut() {
                match slot {
                    Slot::Empty => {
                        *slot = Slot::Tile {
                            value: background,
                            active: true,
                        };
                    }
                    Slot::Tile { active, .. } => *active = true,
                    Slot::Node(child) => activate_subtree(child, background),
                }
            }
        }
    }
}
