use std::array;
use std::marker::PhantomData;

use glam::IVec3;

use crate::traverse::{NodeMut, NodeOp};
use crate::tree::{InternalNode, LeafNode, Node, RootNode, RootSlot, Slot, Tree};
use crate::voxel::VoxelValue;

/// Per-node operator assigning combined values to every active entry of the
/// destination tree.
///
/// Holds read-only references to `N` source trees of the destination's
/// configuration. For each destination node the matching source node (same
/// origin and level) is looked up once; a source with no matching node is
/// constant over the node's whole region (an enclosing active tile's value,
/// or its background), so a single point query stands in for it. The
/// operator writes only into the node it is handed, so invocations for
/// distinct nodes are free to run concurrently.
pub struct TreeMergeOp<'a, V, W, F, const N: usize>
where
    V: VoxelValue,
    W: VoxelValue,
    F: Fn([V; N]) -> W + Sync,
{
    sources: [&'a Tree<V>; N],
    combine: F,
    _out: PhantomData<W>,
}

impl<'a, V, W, F, const N: usize> TreeMergeOp<'a, V, W, F, N>
where
    V: VoxelValue,
    W: VoxelValue,
    F: Fn([V; N]) -> W + Sync,
{
    #[must_use]
    pub fn new(sources: [&'a Tree<V>; N], combine: F) -> Self {
        assert!(N > 0, "merge requires at least one source tree");
        Self {
            sources,
            combine,
            _out: PhantomData,
        }
    }

    /// Combined value at `coord`, each source contributing its stored value
    /// where active and its background everywhere else.
    fn combine_at(&self, coord: IVec3) -> W {
        (self.combine)(array::from_fn(|i| self.sources[i].value_at(coord)))
    }

    fn merge_root(&self, root: &mut RootNode<W>) {
        for (origin, slot) in root.iter_mut() {
            if let RootSlot::Tile {
                value,
                active: true,
            } = slot
            {
                *value = self.combine_at(*origin);
            }
        }
    }

    fn merge_internal(&self, node: &mut InternalNode<W>) {
        let origin = node.origin();
        let level = node.level();

        let matching: [Option<&InternalNode<V>>; N] = array::from_fn(|i| {
            self.sources[i]
                .probe_node(origin, level)
                .map(|found| match found {
                    Node::Internal(inner) => inner,
                    Node::Leaf(_) => {
                        panic!("corrupt source tree: leaf found at level {level}")
                    }
                })
        });
        // with no matching node the source is constant over this region
        let fallback: [V; N] = array::from_fn(|i| self.sources[i].value_at(origin));
        let backgrounds: [V; N] = array::from_fn(|i| self.sources[i].background());

        for index in 0..node.slot_count() {
            if !matches!(node.slot(index), Slot::Tile { active: true, .. }) {
                continue;
            }

            let combined = (self.combine)(array::from_fn(|i| match matching[i] {
                Some(src) => match src.slot(index) {
                    Slot::Tile {
                        value,
                        active: true,
                    } => *value,
                    Slot::Empty | Slot::Tile { active: false, .. } => backgrounds[i],
                    Slot::Node(_) => panic!(
                        "corrupt topology: source child expanded under a merged tile"
                    ),
                },
                None => fallback[i],
            }));

            let Slot::Tile { value, .. } = node.slot_mut(index) else {
                unreachable!()
            };
            *value = combined;
        }
    }

    fn merge_leaf(&self, leaf: &mut LeafNode<W>) {
        let origin = leaf.origin();

        let matching: [Option<&LeafNode<V>>; N] = array::from_fn(|i| {
            self.sources[i]
                .probe_node(origin, 0)
                .map(|found| match found {
                    Node::Leaf(src) => src,
                    Node::Internal(_) => {
                        panic!("corrupt source tree: internal node found at leaf level")
                    }
                })
        });
        let fallback: [V; N] = array::from_fn(|i| self.sources[i].value_at(origin));
        let backgrounds: [V; N] = array::from_fn(|i| self.sources[i].background());

        for index in 0..leaf.voxel_count() {
            if !leaf.active(index) {
                continue;
            }
            let combined = (self.combine)(array::from_fn(|i| match matching[i] {
                Some(src) => src.value_if_active(index, backgrounds[i]),
                None => fallback[i],
            }));
            leaf.set_value(index, combined);
        }
    }
}

impl<V, W, F, const N: usize> NodeOp<W> for TreeMergeOp<'_, V, W, F, N>
where
    V: VoxelValue,
    W: VoxelValue,
    F: Fn([V; N]) -> W + Sync,
{
    fn apply(&self, node: NodeMut<'_, W>) {
        match node {
            NodeMut::Root(root) => self.merge_root(root),
            NodeMut::Internal(inner) => self.merge_internal(inner),
            NodeMut::Leaf(leaf) => self.merge_leaf(leaf),
        }
    }
}
