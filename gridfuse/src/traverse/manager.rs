//! Module `traverse::manager`
//!
//! Defines [`NodeManager`], the per-traversal cache enumerating a tree's
//! nodes by level so an operator can be applied to them level by level, in
//! parallel within each level.

use std::marker::PhantomData;

use log::trace;
use rayon::prelude::*;

use crate::tree::{InternalNode, LeafNode, Node, RootNode, RootSlot, Slot, Tree};
use crate::voxel::VoxelValue;

/// Mutable visitor handle for one node of the tree being traversed.
pub enum NodeMut<'a, V> {
    Root(&'a mut RootNode<V>),
    Internal(&'a mut InternalNode<V>),
    Leaf(&'a mut LeafNode<V>),
}

/// Per-node operator applied during traversal.
///
/// An operator may mutate only the node it is handed, and only that node's
/// own entries; it must not change the tree's shape. Reads against other
/// trees are unrestricted. Invocations for distinct nodes of one level run
/// concurrently.
pub trait NodeOp<V>: Sync {
    fn apply(&self, node: NodeMut<'_, V>);
}

struct NodePtr<V>(*mut Node<V>);

// Raw node pointers cross rayon's thread boundary. Each pointer names a
// distinct node of a tree the manager borrows exclusively, so handing them
// to worker threads cannot alias.
unsafe impl<V: Send> Send for NodePtr<V> {}
unsafe impl<V: Sync> Sync for NodePtr<V> {}

/// Call-scoped index of every node of one tree, partitioned by level.
///
/// The cache exclusively borrows its tree for its whole lifetime and must
/// be rebuilt after any structural mutation; it holds back-references only
/// and owns no nodes.
pub struct NodeManager<'t, V: VoxelValue> {
    tree: *mut Tree<V>,
    levels: Vec<Vec<NodePtr<V>>>,
    _borrow: PhantomData<&'t mut Tree<V>>,
}

impl<'t, V: VoxelValue> NodeManager<'t, V> {
    /// Enumerates all nodes of `tree` in a single pass.
    pub fn new(tree: &'t mut Tree<V>) -> Self {
        let level_count = tree.config().internal_levels() as usize + 1;
        let mut levels: Vec<Vec<NodePtr<V>>> =
            (0..level_count).map(|_| Vec::new()).collect();

        for (_, slot) in tree.root_mut().iter_mut() {
            if let RootSlot::Node(node) = slot {
                collect_nodes(node.as_mut(), &mut levels);
            }
        }

        trace!(
            "cached {} nodes across {} levels",
            levels.iter().map(Vec::len).sum::<usize>(),
            level_count
        );

        Self {
            tree: tree as *mut Tree<V>,
            levels,
            _borrow: PhantomData,
        }
    }

    /// Number of levels below the root (leaf level included).
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Number of cached nodes at `level` (0 = leaf).
    #[must_use]
    pub fn node_count(&self, level: u32) -> usize {
        self.levels[level as usize].len()
    }

    /// Total number of cached nodes, the root excluded.
    #[must_use]
    pub fn total_node_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Applies `op` to the root, then to every level from the coarsest down
    /// to the leaves. Within one level nodes are processed in parallel with
    /// no ordering between them.
    pub fn apply_top_down<Op: NodeOp<V>>(&mut self, op: &Op) {
        // SAFETY: the manager holds the only borrow of the tree; nothing
        // else can touch the root while the operator runs on it.
        let root = unsafe { (*self.tree).root_mut() };
        op.apply(NodeMut::Root(root));

        for level in (0..self.levels.len()).rev() {
            self.apply_level(level, op);
        }
    }

    /// Mirror traversal: leaves first, coarser levels after, the root last.
    pub fn apply_bottom_up<Op: NodeOp<V>>(&mut self, op: &Op) {
        for level in 0..self.levels.len() {
            self.apply_level(level, op);
        }

        // SAFETY: as in `apply_top_down`; the level passes have completed
        // before the root is visited.
        let root = unsafe { (*self.tree).root_mut() };
        op.apply(NodeMut::Root(root));
    }

    fn apply_level<Op: NodeOp<V>>(&self, level: usize, op: &Op) {
        self.levels[level].par_iter().for_each(|ptr| {
            // SAFETY: every cached pointer names a distinct node and the
            // tree's shape is frozen while the cache is alive, so each task
            // gets exclusive access to its node.
            match unsafe { &mut *ptr.0 } {
                Node::Internal(node) => op.apply(NodeMut::Internal(node)),
                Node::Leaf(leaf) => op.apply(NodeMut::Leaf(leaf)),
            }
        });
    }
}

fn collect_nodes<V: VoxelValue>(node: &mut Node<V>, levels: &mut [Vec<NodePtr<V>>]) {
    levels[node.level() as usize].push(NodePtr(node as *mut Node<V>));

    if let Node::Internal(inner) = node {
        for slot in inner.slots_mut() {
            if let Slot::Node(child) = slot {
                collect_nodes(child.as_mut(), levels);
            }
        }
    }
}
