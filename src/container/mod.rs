//! Container substrate: the byte-tree abstraction a document is stored in.

mod container;
mod entry;
mod fingerprint;

pub use container::{Container, is_valid_entry_name};
pub use entry::Entry;
pub use fingerprint::Fingerprint;
