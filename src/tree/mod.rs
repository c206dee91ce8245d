pub mod index;
pub mod model;
pub mod node;

pub use model::FileTreeModel;
pub use node::{Node, NodeId, NodeKind, Snapshot};
