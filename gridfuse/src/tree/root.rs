use glam::IVec3;
use rustc_hash::FxHashMap;

use crate::voxel::VoxelValue;

use super::Node;

/// One entry of the root table: a constant tile covering a whole root-child
/// cube, or an expanded child node.
#[derive(Clone, PartialEq, Debug)]
pub enum RootSlot<V> {
    Tile { value: V, active: bool },
    Node(Box<Node<V>>),
}

/// Sparse top of the tree: a hash map from root-child origin to entry, plus
/// the background value returned for every uncovered coordinate.
#[derive(Clone, PartialEq, Debug)]
pub struct RootNode<V> {
    background: V,
    table: FxHashMap<IVec3, RootSlot<V>>,
}

impl<V: VoxelValue> RootNode<V> {
    #[must_use]
    pub fn new(background: V) -> Self {
        Self {
            background,
            table: FxHashMap::default(),
        }
    }

    #[must_use]
    #[inline(always)]
    pub fn background(&self) -> V {
        self.background
    }

    /// Number of root table entries (tiles and child nodes).
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[must_use]
    pub fn get(&self, origin: IVec3) -> Option<&RootSlot<V>> {
        self.table.get(&origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IVec3, &RootSlot<V>)> {
        self.table.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&IVec3, &mut RootSlot<V>)> {
        self.table.iter_mut()
    }

    pub(crate) fn insert(&mut self, origin: IVec3, slot: RootSlot<V>) {
        self.table.insert(origin, slot);
    }

    pub(crate) fn entry(
        &mut self,
        origin: IVec3,
    ) -> std::collections::hash_map::Entry<'_, IVec3, RootSlot<V>> {
        self.table.entry(origin)
    }
}
