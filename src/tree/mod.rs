//! Arena-backed tree of named file and directory nodes.
//!
//! Directories own their children through their child maps; the parent link
//! stored on every node is only a back-reference into the arena.

mod error;
mod node;
mod node_id;
mod tree;

pub use error::StructuralError;
pub(crate) use node::{Node, NodeKind};
pub use node_id::NodeId;
pub use tree::Tree;
