use glam::DVec3;

use crate::core::TreeConfig;
use crate::tree::Tree;
use crate::voxel::VoxelValue;

/// Placement of a grid's index space in world space: a uniform voxel size
/// and a translation.
///
/// The merge engine only ever compares transforms for equality; grids with
/// different transforms cannot be combined. No tolerance is applied.
#[derive(Clone, PartialEq, Debug)]
pub struct Transform {
    voxel_size: f64,
    translation: DVec3,
}

impl Transform {
    /// Unit voxels, no translation.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            voxel_size: 1.0,
            translation: DVec3::ZERO,
        }
    }

    #[must_use]
    pub fn uniform(voxel_size: f64) -> Self {
        Self {
            voxel_size,
            translation: DVec3::ZERO,
        }
    }

    #[must_use]
    pub fn with_translation(voxel_size: f64, translation: DVec3) -> Self {
        Self {
            voxel_size,
            translation,
        }
    }

    #[must_use]
    #[inline(always)]
    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    #[must_use]
    #[inline(always)]
    pub fn translation(&self) -> DVec3 {
        self.translation
    }
}

/// A sparse voxel volume: a [`Tree`] paired with a [`Transform`].
///
/// Grids are the unit exchanged with the outside world. A grid owns its
/// tree exclusively; returning a grid transfers that ownership to the
/// caller with no aliases left behind.
#[derive(Clone, PartialEq, Debug)]
pub struct Grid<V> {
    tree: Tree<V>,
    transform: Transform,
}

impl<V: VoxelValue> Grid<V> {
    #[must_use]
    pub fn new(tree: Tree<V>, transform: Transform) -> Self {
        Self { tree, transform }
    }

    /// An empty grid with the standard tree configuration, an identity
    /// transform, and the given background value.
    #[must_use]
    pub fn empty(background: V) -> Self {
        Self::new(
            Tree::new(TreeConfig::standard(), background),
            Transform::identity(),
        )
    }

    #[must_use]
    #[inline(always)]
    pub fn tree(&self) -> &Tree<V> {
        &self.tree
    }

    #[inline(always)]
    pub fn tree_mut(&mut self) -> &mut Tree<V> {
        &mut self.tree
    }

    #[must_use]
    #[inline(always)]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[must_use]
    #[inline(always)]
    pub fn background(&self) -> V {
        self.tree.background()
    }

    #[must_use]
    pub fn into_tree(self) -> Tree<V> {
        self.tree
    }
}
