use std::cell::OnceCell;

use hashlink::LinkedHashMap;

use crate::payload::CachedPayload;
use crate::tree::NodeId;
use crate::write_back::{DataProducer, DirtyObserver};

/// Contents of a node. The variant is fixed at construction.
pub(crate) enum NodeKind {
    File(Vec<u8>),
    Directory(LinkedHashMap<String, NodeId>),
}

pub(crate) struct Node {
    pub(crate) key: String,
    pub(crate) kind: NodeKind,
    /// Non-owning back-link, `None` for roots and detached nodes.
    pub(crate) parent: Option<NodeId>,
    /// Set on the first read attempt; holds `None` when that decode failed.
    pub(crate) payload: OnceCell<Option<CachedPayload>>,
    pub(crate) dirty: bool,
    pub(crate) producer: Option<Box<dyn DataProducer>>,
    pub(crate) observer: Option<Box<dyn DirtyObserver>>,
}

impl Node {
    pub(crate) fn new(key: String, kind: NodeKind) -> Self {
        Self {
            key,
            kind,
            parent: None,
            payload: OnceCell::new(),
            dirty: false,
            producer: None,
            observer: None,
        }
    }

    pub(crate) fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    pub(crate) fn children(&self) -> Option<&LinkedHashMap<String, NodeId>> {
        match &self.kind {
            NodeKind::Directory(children) => Some(children),
            NodeKind::File(_) => None,
        }
    }
}
