use glam::IVec3;

use crate::core::TreeConfig;
use crate::voxel::VoxelValue;

use super::Node;

/// One child entry of an internal node.
///
/// Every slot is exactly one of: nothing (implicit background), a constant
/// tile covering the whole child cube, or an expanded child node.
#[derive(Clone, PartialEq, Debug)]
pub enum Slot<V> {
    Empty,
    Tile { value: V, active: bool },
    Node(Box<Node<V>>),
}

/// Branching node covering a `dim³` arrangement of children
/// (`dim = 1 << log2`), each child spanning `1 << child_shift` voxels per
/// axis.
#[derive(Clone, PartialEq, Debug)]
pub struct InternalNode<V> {
    origin: IVec3,
    level: u32,
    log2: u32,
    child_shift: u32,
    slots: Vec<Slot<V>>,
}

impl<V: VoxelValue> InternalNode<V> {
    /// Creates an internal node with every slot empty.
    #[must_use]
    pub fn new(config: &TreeConfig, level: u32, origin: IVec3) -> Self {
        debug_assert!(level >= 1 && level <= config.internal_levels());
        let count = config.slot_count(level);
        Self {
            origin,
            level,
            log2: config.branch_log2(level),
            child_shift: config.span_log2(level - 1),
            slots: (0..count).map(|_| Slot::Empty).collect(),
        }
    }

    /// Creates an internal node with every slot holding the same tile.
    /// Used when a coarser tile is expanded in place.
    #[must_use]
    pub fn uniform(
        config: &TreeConfig,
        level: u32,
        origin: IVec3,
        value: V,
        active: bool,
    ) -> Self {
        let mut node = Self::new(config, level, origin);
        for slot in &mut node.slots {
            *slot = Slot::Tile { value, active };
        }
        node
    }

    #[must_use]
    #[inline(always)]
    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    #[must_use]
    #[inline(always)]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    #[inline(always)]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Flat slot index of `coord`, which must lie inside this node.
    #[must_use]
    #[inline(always)]
    pub fn index_of(&self, coord: IVec3) -> usize {
        let mask = (1usize << self.log2) - 1;
        let x = ((coord.x >> self.child_shift) as usize) & mask;
        let y = ((coord.y >> self.child_shift) as usize) & mask;
        let z = ((coord.z >> self.child_shift) as usize) & mask;
        x | (y << self.log2) | (z << (2 * self.log2))
    }

    /// Minimum corner of the child cube at `index`.
    #[must_use]
    pub fn origin_of_slot(&self, index: usize) -> IVec3 {
        let mask = (1usize << self.log2) - 1;
        let x = ((index & mask) as i32) << self.child_shift;
        let y = (((index >> self.log2) & mask) as i32) << self.child_shift;
        let z = (((index >> (2 * self.log2)) & mask) as i32) << self.child_shift;
        self.origin + IVec3::new(x, y, z)
    }

    #[must_use]
    #[inline(always)]
    pub fn slot(&self, index: usize) -> &Slot<V> {
        &self.slots[index]
    }

    #[inline(always)]
    pub fn slot_mut(&mut self, index: usize) -> &mut Slot<V> {
        &mut self.slots[index]
    }

    #[must_use]
    pub fn slots(&self) -> &[Slot<V>] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Slot<V>] {
        &mut self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TreeConfig {
        TreeConfig::new(2, &[2, 2])
    }

    #[test]
    fn test_new_empty() {
        let node = InternalNode::<f32>::new(&config(), 1, IVec3::ZERO);
        assert_eq!(node.slot_count(), 64);
        assert!(node.slots().iter().all(|slot| matches!(slot, Slot::Empty)));
    }

    #[test]
    fn test_uniform() {
        let node = InternalNode::uniform(&config(), 2, IVec3::ZERO, 1.5f32, true);
        assert!(node.slots().iter().all(
            |slot| matches!(slot, Slot::Tile { value, active: true } if *value == 1.5)
        ));
    }

    #[test]
    fn test_index_origin_roundtrip() {
        let config = config();
        // level 1 node at a negative origin, children span 4 voxels
        let origin = IVec3::new(-16, 0, 16);
        let node = InternalNode::<f32>::new(&config, 1, origin);

        for index in 0..node.slot_count() {
            let slot_origin = node.origin_of_slot(index);
            assert_eq!(node.index_of(slot_origin), index);
            assert_eq!(config.origin_at(0, slot_origin), slot_origin);
        }
    }

    #[test]
    fn test_index_matches_config() {
        let config = config();
        let node = InternalNode::<f32>::new(&config, 2, IVec3::ZERO);
        for &coord in &[
            IVec3::new(0, 0, 0),
            IVec3::new(15, 3, 60),
            IVec3::new(63, 63, 63),
        ] {
            assert_eq!(node.index_of(coord), config.child_index(2, coord));
        }
    }
}
