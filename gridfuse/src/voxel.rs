/// Blanket trait for per-voxel value types stored in grids and trees.
///
/// Scalar components and their fixed-size compounds (`f32`, `[f32; 3]`, ...)
/// all qualify automatically. `Send + Sync` is required because node lists
/// are processed in parallel during traversal.
pub trait VoxelValue:
    Clone + Copy + PartialEq + Send + Sync + std::fmt::Debug + 'static
{
}

impl<T> VoxelValue for T where
    T: Clone + Copy + PartialEq + Send + Sync + std::fmt::Debug + 'static
{
}
