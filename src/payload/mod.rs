//! Typed payloads and the per-node decode-once cache.

mod cache;
mod payload;

pub(crate) use cache::CachedPayload;
pub use payload::{Bincoded, Payload};
