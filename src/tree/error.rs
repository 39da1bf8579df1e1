use snafu::Snafu;

use crate::tree::NodeId;

/// Precondition violations of structural operations.
///
/// These are programmer errors: callers are expected to check preconditions
/// first or treat the error as fatal. Every operation reports them before
/// touching the tree, so a failed call leaves the tree unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StructuralError {
    #[snafu(display("'{}' is not a valid node key", key))]
    InvalidKey { key: String },
    #[snafu(display("Node '{}' is not a directory", key))]
    NotDirectory { key: String },
    #[snafu(display("Directory '{}' already contains an entry named '{}'", directory, key))]
    DuplicateKey { directory: String, key: String },
    #[snafu(display("'{}' is not a child of '{}'", key, directory))]
    NotFound { directory: String, key: String },
    #[snafu(display("Node '{}' is already attached to a parent", key))]
    AlreadyAttached { key: String },
    #[snafu(display("Attaching '{}' under '{}' would create a cycle", key, directory))]
    WouldCycle { directory: String, key: String },
    #[snafu(display("Node handle {} does not refer to a live node", id))]
    StaleNode { id: NodeId },
}
