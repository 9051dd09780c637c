//! Merging several sparse grids into one.
//!
//! The destination's active topology is built first as the union of every
//! source's, then a node-manager traversal assigns each active entry the
//! combined value of the sources at that location. Sources are borrowed
//! read-only for the whole call; the returned grid owns its tree with no
//! aliases left behind.

mod op;

pub use op::TreeMergeOp;

use std::array;

use log::debug;

use crate::core::MergeError;
use crate::grid::Grid;
use crate::traverse::NodeManager;
use crate::tree::Tree;
use crate::voxel::VoxelValue;

/// Merges `N` grids into one, combining the per-coordinate values with
/// `combine`.
///
/// Every active coordinate of any source is active in the result; its value
/// is `combine` applied to each source's value there (the stored value
/// where the source is active, that source's background where it is not).
/// The result's background is `combine` of the source backgrounds, and its
/// transform and tree configuration are shared with the inputs.
///
/// # Errors
/// - [`MergeError::TransformMismatch`] if the grids' transforms are not
///   exactly equal.
/// - [`MergeError::ConfigMismatch`] if the trees' level configurations
///   differ.
///
/// Both are checked before any allocation; a failed merge produces no
/// partial result.
pub fn merge_grids<V, W, F, const N: usize>(
    sources: [&Grid<V>; N],
    combine: F,
) -> Result<Grid<W>, MergeError>
where
    V: VoxelValue,
    W: VoxelValue,
    F: Fn([V; N]) -> W + Sync,
{
    assert!(N > 0, "merge requires at least one source grid");

    let first = sources[0];
    if sources
        .iter()
        .any(|grid| grid.transform() != first.transform())
    {
        return Err(MergeError::TransformMismatch);
    }
    if sources
        .iter()
        .any(|grid| grid.tree().config() != first.tree().config())
    {
        return Err(MergeError::ConfigMismatch);
    }

    let background = combine(array::from_fn(|i| sources[i].background()));
    let mut tree = Tree::new(first.tree().config().clone(), background);
    for grid in &sources {
        tree.union_topology(grid.tree())?;
    }

    debug!(
        "merged topology of {} grids: {} leaves, {} active tiles",
        N,
        tree.leaf_count(),
        tree.active_tile_count()
    );

    let op = TreeMergeOp::new(array::from_fn(|i| sources[i].tree()), combine);
    NodeManager::new(&mut tree).apply_top_down(&op);

    Ok(Grid::new(tree, first.transform().clone()))
}

/// Assembles a vector-valued grid from three scalar grids.
///
/// The transforms and tree configurations of the inputs must be equal. The
/// result's topology is the union of the inputs'; each entry packs the
/// three sources' values at that location, substituting a source's
/// background where it has no active data.
pub fn vector_from_scalar<V: VoxelValue>(
    x: &Grid<V>,
    y: &Grid<V>,
    z: &Grid<V>,
) -> Result<Grid<[V; 3]>, MergeError> {
    merge_grids([x, y, z], |components: [V; 3]| components)
}

#[cfg(test)]
mod tests {
    use glam::IVec3;
    use rand::Rng;

    use crate::core::TreeConfig;
    use crate::grid::Transform;

    use super::*;

    fn small_grid(background: f32) -> Grid<f32> {
        Grid::new(
            Tree::new(TreeConfig::new(2, &[2, 2]), background),
            Transform::identity(),
        )
    }

    #[test]
    fn test_empty_grids() {
        let x = Grid::empty(1.1f32);
        let y = Grid::empty(2.2f32);
        let z = Grid::empty(3.3f32);

        let merged = vector_from_scalar(&x, &y, &z).unwrap();

        assert_eq!(merged.background(), [1.1, 2.2, 3.3]);
        assert!(merged.tree().is_empty());
        assert_eq!(merged.tree().active_tile_count(), 0);
        assert_eq!(merged.tree().leaf_count(), 0);
        assert_eq!(merged.tree().active_voxel_count(), 0);
    }

    #[test]
    fn test_merge_root_tiles() {
        let mut x = Grid::empty(-0.1f32);
        let mut y = Grid::empty(-0.2f32);
        let mut z = Grid::empty(-0.3f32);

        let root_level = x.tree().config().root_level();
        let stride = x.tree().config().root_stride();
        let column = |index: i32| IVec3::new(index * stride, 0, 0);

        // Various overlapping and non-overlapping tiles
        // index  | 0    1    2    3    4    5    6    7
        // -------|---------------------------------------
        // x grid |    [1.1]     [3.1]     [5.1]     [7.1]
        // y grid |         [2.2][3.2]          [6.2][7.2]
        // z grid |                   [4.3][5.3][6.3][7.3]

        for (index, value) in [(1, 1.1), (3, 3.1), (5, 5.1), (7, 7.1)] {
            x.tree_mut().add_tile(root_level, column(index), value, true);
        }
        for (index, value) in [(2, 2.2), (3, 3.2), (6, 6.2), (7, 7.2)] {
            y.tree_mut().add_tile(root_level, column(index), value, true);
        }
        for (index, value) in [(4, 4.3), (5, 5.3), (6, 6.3), (7, 7.3)] {
            z.tree_mut().add_tile(root_level, column(index), value, true);
        }

        let merged = vector_from_scalar(&x, &y, &z).unwrap();
        let tree = merged.tree();

        assert_eq!(merged.background(), [-0.1, -0.2, -0.3]);
        assert_eq!(tree.active_tile_count(), 7);
        assert_eq!(tree.leaf_count(), 0);

        assert_eq!(tree.value_at(column(0)), [-0.1, -0.2, -0.3]);
        assert_eq!(tree.value_at(column(1)), [1.1, -0.2, -0.3]);
        assert_eq!(tree.value_at(column(2)), [-0.1, 2.2, -0.3]);
        assert_eq!(tree.value_at(column(3)), [3.1, 3.2, -0.3]);
        assert_eq!(tree.value_at(column(4)), [-0.1, -0.2, 4.3]);
        assert_eq!(tree.value_at(column(5)), [5.1, -0.2, 5.3]);
        assert_eq!(tree.value_at(column(6)), [-0.1, 6.2, 6.3]);
        assert_eq!(tree.value_at(column(7)), [7.1, 7.2, 7.3]);
        assert_eq!(tree.value_at(column(8)), [-0.1, -0.2, -0.3]);

        assert_eq!(tree.value_depth(column(0)), -1);
        for index in 1..=7 {
            assert_eq!(tree.value_depth(column(index)), 0);
        }
        assert_eq!(tree.value_depth(column(8)), -1);
    }

    #[test]
    fn test_transform_mismatch() {
        let x = Grid::empty(0.0f32);
        let y = Grid::new(
            Tree::new(TreeConfig::standard(), 0.0f32),
            Transform::uniform(0.5),
        );
        let z = Grid::empty(0.0f32);

        assert_eq!(
            vector_from_scalar(&x, &y, &z),
            Err(MergeError::TransformMismatch)
        );
    }

    #[test]
    fn test_config_mismatch() {
        let x = small_grid(0.0);
        let y = Grid::new(
            Tree::new(TreeConfig::new(2, &[3, 2]), 0.0f32),
            Transform::identity(),
        );
        let z = small_grid(0.0);

        assert_eq!(
            vector_from_scalar(&x, &y, &z),
            Err(MergeError::ConfigMismatch)
        );
    }

    #[test]
    fn test_merge_mixed_topology() {
        let mut x = small_grid(-1.0);
        let mut y = small_grid(-2.0);
        let z = small_grid(-3.0);

        // x: one voxel; y: a fine tile over the same leaf region and a
        // coarse tile elsewhere; z: nothing at all
        x.tree_mut().set_value(IVec3::new(1, 2, 3), 10.0);
        y.tree_mut().add_tile(1, IVec3::ZERO, 20.0, true);
        y.tree_mut().add_tile(2, IVec3::new(16, 16, 16), 22.0, true);

        let merged = vector_from_scalar(&x, &y, &z).unwrap();
        let tree = merged.tree();

        assert_eq!(merged.background(), [-1.0, -2.0, -3.0]);

        // covered by x's voxel and y's fine tile
        assert_eq!(tree.value_at(IVec3::new(1, 2, 3)), [10.0, 20.0, -3.0]);
        assert_eq!(tree.value_depth(IVec3::new(1, 2, 3)), 3);

        // covered by y's fine tile only; x is inactive there
        assert_eq!(tree.value_at(IVec3::new(3, 3, 3)), [-1.0, 20.0, -3.0]);

        // covered by y's coarse tile only
        assert!(tree.active_at(IVec3::new(20, 20, 20)));
        assert_eq!(tree.value_at(IVec3::new(20, 20, 20)), [-1.0, 22.0, -3.0]);
        assert_eq!(tree.value_depth(IVec3::new(20, 20, 20)), 1);

        // covered by nothing
        assert!(!tree.active_at(IVec3::new(5, 0, 0)));
        assert_eq!(tree.value_at(IVec3::new(5, 0, 0)), [-1.0, -2.0, -3.0]);

        assert_eq!(tree.leaf_count(), 1);
    }

    #[test]
    fn test_topology_union_completeness() {
        let mut x = small_grid(0.0);
        let mut y = small_grid(0.0);
        let mut z = small_grid(0.0);

        x.tree_mut().set_value(IVec3::new(0, 0, 0), 1.0);
        y.tree_mut().add_tile(1, IVec3::new(8, 0, 0), 2.0, true);
        z.tree_mut().set_value(IVec3::new(-5, -5, -5), 3.0);

        let merged = vector_from_scalar(&x, &y, &z).unwrap();

        for x_coord in -8..16 {
            for z_coord in -8..8 {
                let coord = IVec3::new(x_coord, x_coord.rem_euclid(4), z_coord);
                let expected = x.tree().active_at(coord)
                    || y.tree().active_at(coord)
                    || z.tree().active_at(coord);
                assert_eq!(merged.tree().active_at(coord), expected, "at {coord}");
            }
        }
    }

    #[test]
    fn test_merge_order_independent() {
        let mut x = small_grid(-1.0);
        let mut y = small_grid(-2.0);
        let mut z = small_grid(-3.0);

        x.tree_mut().set_value(IVec3::new(1, 1, 1), 1.0);
        y.tree_mut().add_tile(1, IVec3::ZERO, 2.0, true);
        let root_level = z.tree().config().root_level();
        z.tree_mut()
            .add_tile(root_level, IVec3::new(64, 0, 0), 3.0, true);

        let forward = vector_from_scalar(&x, &y, &z).unwrap();
        let reversed = merge_grids([&z, &y, &x], |values: [f32; 3]| {
            [values[2], values[1], values[0]]
        })
        .unwrap();

        assert_eq!(forward.tree(), reversed.tree());
    }

    #[test]
    fn test_merge_sum_of_two() {
        let mut a = small_grid(1.0);
        let mut b = small_grid(2.0);
        a.tree_mut().set_value(IVec3::new(2, 2, 2), 10.0);
        b.tree_mut().set_value(IVec3::new(2, 2, 2), 20.0);
        b.tree_mut().set_value(IVec3::new(3, 2, 2), 5.0);

        let merged: Grid<f32> =
            merge_grids([&a, &b], |values: [f32; 2]| values[0] + values[1]).unwrap();

        assert_eq!(merged.background(), 3.0);
        assert_eq!(merged.tree().value_at(IVec3::new(2, 2, 2)), 30.0);
        // a is inactive at (3, 2, 2), its background substitutes
        assert_eq!(merged.tree().value_at(IVec3::new(3, 2, 2)), 6.0);
        assert_eq!(merged.tree().active_voxel_count(), 2);
    }

    #[test]
    fn test_merge_standard_config_voxels() {
        let mut x = Grid::empty(-0.1f32);
        let y = Grid::empty(-0.2f32);
        let mut z = Grid::empty(-0.3f32);

        x.tree_mut().set_value(IVec3::new(100, 20, 3), 1.5);
        z.tree_mut().set_value(IVec3::new(100, 20, 3), 3.5);
        z.tree_mut().set_value(IVec3::new(-100, -20, -3), 4.5);

        let merged = vector_from_scalar(&x, &y, &z).unwrap();
        let tree = merged.tree();

        assert_eq!(tree.value_at(IVec3::new(100, 20, 3)), [1.5, -0.2, 3.5]);
        assert_eq!(
            tree.value_at(IVec3::new(-100, -20, -3)),
            [-0.1, -0.2, 4.5]
        );
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.active_voxel_count(), 2);
        assert_eq!(tree.value_depth(IVec3::new(100, 20, 3)), 3);
    }

    #[test]
    fn test_merge_random_consistency() {
        let mut rng = rand::rng();

        let mut grids = [small_grid(-1.0), small_grid(-2.0), small_grid(-3.0)];
        for _ in 0..200 {
            let coord = IVec3::new(
                rng.random_range(0..32),
                rng.random_range(0..32),
                rng.random_range(0..32),
            );
            let which = rng.random_range(0..3);
            let value = rng.random_range(1..100) as f32;
            grids[which].tree_mut().set_value(coord, value);
        }

        let [x, y, z] = &grids;
        let merged = vector_from_scalar(x, y, z).unwrap();

        for x_coord in 0..32 {
            for y_coord in 0..32 {
                for z_coord in 0..32 {
                    let coord = IVec3::new(x_coord, y_coord, z_coord);
                    let expected_active = x.tree().active_at(coord)
                        || y.tree().active_at(coord)
                        || z.tree().active_at(coord);
                    assert_eq!(merged.tree().active_at(coord), expected_active);
                    assert_eq!(
                        merged.tree().value_at(coord),
                        [
                            x.tree().value_at(coord),
                            y.tree().value_at(coord),
                            z.tree().value_at(coord),
                        ]
                    );
                }
            }
        }
    }
}
