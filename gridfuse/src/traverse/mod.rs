mod manager;

pub use manager::{NodeManager, NodeMut, NodeOp};
