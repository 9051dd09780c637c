pub mod core;
pub mod grid;
pub mod merge;
pub mod traverse;
pub mod tree;
pub mod voxel;

pub use crate::core::{BitMask, MergeError, TreeConfig};
pub use grid::{Grid, Transform};
pub use merge::{TreeMergeOp, merge_grids, vector_from_scalar};
pub use traverse::{NodeManager, NodeMut, NodeOp};
pub use tree::{InternalNode, LeafNode, Node, RootNode, RootSlot, Slot, Tree};
pub use voxel::VoxelValue;
