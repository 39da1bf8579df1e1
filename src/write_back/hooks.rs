use crate::tree::NodeId;

/// Produces the bytes that replace a dirty node's contents during a flush.
///
/// Returning `None` abstains: the node's bytes are left as they are.
pub trait DataProducer {
    fn produce(&mut self, node: NodeId, key: &str) -> Option<Vec<u8>>;
}

impl<F> DataProducer for F
where
    F: FnMut(NodeId, &str) -> Option<Vec<u8>>,
{
    fn produce(&mut self, node: NodeId, key: &str) -> Option<Vec<u8>> {
        self(node, key)
    }
}

/// Notified synchronously on every flip of a node's dirty flag.
pub trait DirtyObserver {
    fn dirty_changed(&mut self, node: NodeId, key: &str, dirty: bool);
}

impl<F> DirtyObserver for F
where
    F: FnMut(NodeId, &str, bool),
{
    fn dirty_changed(&mut self, node: NodeId, key: &str, dirty: bool) {
        self(node, key, dirty)
    }
}
