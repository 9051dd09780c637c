mod internal;
mod leaf;
mod node;
mod root;
mod tree;
mod union;

pub use internal::{InternalNode, Slot};
pub use leaf::LeafNode;
pub use node::Node;
pub use root::{RootNode, RootSlot};
pub use tree::Tree;
