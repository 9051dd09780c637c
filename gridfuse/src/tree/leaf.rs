use glam::IVec3;

use crate::core::BitMask;
use crate::voxel::VoxelValue;

/// Dense per-voxel storage at the finest tree level.
///
/// A leaf covers a `dim³` cube of voxels (`dim = 1 << log2`) starting at
/// `origin`; every voxel carries a value and an active bit. Inactive voxels
/// keep whatever value they were constructed with but resolve to the owning
/// tree's background on read.
#[derive(Clone, PartialEq, Debug)]
pub struct LeafNode<V> {
    origin: IVec3,
    log2: u32,
    values: Vec<V>,
    mask: BitMask,
}

impl<V: VoxelValue> LeafNode<V> {
    /// Creates a leaf with every voxel inactive and set to `fill`.
    #[must_use]
    pub fn new(origin: IVec3, log2: u32, fill: V) -> Self {
        let count = 1usize << (3 * log2);
        Self {
            origin,
            log2,
            values: vec![fill; count],
            mask: BitMask::new(count),
        }
    }

    /// Creates a leaf with every voxel set to `value`, all active or all
    /// inactive. Used when a constant tile is expanded in place.
    #[must_use]
    pub fn filled(origin: IVec3, log2: u32, value: V, active: bool) -> Self {
        let mut leaf = Self::new(origin, log2, value);
        if active {
            leaf.mask.fill();
        }
        leaf
    }

    pub(crate) fn with_mask(origin: IVec3, log2: u32, fill: V, mask: BitMask) -> Self {
        let count = 1usize << (3 * log2);
        debug_assert_eq!(mask.len(), count);
        Self {
            origin,
            log2,
            values: vec![fill; count],
            mask,
        }
    }

    #[must_use]
    #[inline(always)]
    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    #[must_use]
    #[inline(always)]
    pub fn voxel_count(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.mask.count_ones()
    }

    /// Flat voxel index of `coord`, which must lie inside this leaf.
    #[must_use]
    #[inline(always)]
    pub fn index_of(&self, coord: IVec3) -> usize {
        let mask = (1usize << self.log2) - 1;
        let x = (coord.x as usize) & mask;
        let y = (coord.y as usize) & mask;
        let z = (coord.z as usize) & mask;
        x | (y << self.log2) | (z << (2 * self.log2))
    }

    #[must_use]
    #[inline(always)]
    pub fn active(&self, index: usize) -> bool {
        self.mask.get(index)
    }

    #[must_use]
    #[inline(always)]
    pub fn value(&self, index: usize) -> V {
        self.values[index]
    }

    /// Stored value if the voxel is active, else `background`.
    #[must_use]
    #[inline(always)]
    pub fn value_if_active(&self, index: usize, background: V) -> V {
        if self.mask.get(index) {
            self.values[index]
        } else {
            background
        }
    }

    /// Writes `value` and activates the voxel.
    #[inline(always)]
    pub fn set_value(&mut self, index: usize, value: V) {
        self.values[index] = value;
        self.mask.set(index);
    }

    #[must_use]
    pub fn mask(&self) -> &BitMask {
        &self.mask
    }

    pub(crate) fn union_mask(&mut self, other: &BitMask) {
        self.mask.union_with(other);
    }

    pub(crate) fn activate_all(&mut self) {
        self.mask.fill();
    }
}
