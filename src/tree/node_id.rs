use std::fmt;

use derive_more::Display;

/// A handle to a node in a [`Tree`](super::Tree).
///
/// Holds a slot index and the generation of that slot, so a handle to a
/// discarded node is recognised as stale even after its slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{idx}@{generation}")]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Returns the raw slot index (for diagnostics only).
    pub const fn index(self) -> u32 {
        self.idx
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}
