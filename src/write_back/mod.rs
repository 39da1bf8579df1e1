//! Dirty tracking and the flush traversal that writes payloads back to bytes.

mod flush;
mod hooks;
mod policy;

pub use flush::FlushReport;
pub use hooks::{DataProducer, DirtyObserver};
pub use policy::{FlushPolicy, UnknownFlushPolicyError};
