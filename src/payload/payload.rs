use std::any::Any;

use bincode::config;
use derive_more::{Deref, DerefMut, From};

/// A typed view of a file node's bytes.
///
/// `decode` must be deterministic and return `None` for bytes it cannot
/// interpret. Types that can be written back override `encode`; the default
/// makes a payload read-only.
pub trait Payload: Any + Sized {
    fn decode(bytes: &[u8]) -> Option<Self>;

    fn encode(&self) -> Option<Vec<u8>> {
        None
    }
}

impl Payload for String {
    fn decode(bytes: &[u8]) -> Option<Self> {
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn encode(&self) -> Option<Vec<u8>> {
        Some(self.as_bytes().to_vec())
    }
}

impl Payload for Vec<u8> {
    fn decode(bytes: &[u8]) -> Option<Self> {
        Some(bytes.to_vec())
    }

    fn encode(&self) -> Option<Vec<u8>> {
        Some(self.clone())
    }
}

/// Stores any bincode type as a payload, using bincode's standard config.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deref, DerefMut, From)]
pub struct Bincoded<T>(pub T);

impl<T> Payload for Bincoded<T>
where
    T: bincode::Encode + bincode::Decode<()> + 'static,
{
    fn decode(bytes: &[u8]) -> Option<Self> {
        match bincode::decode_from_slice(bytes, config::standard()) {
            Ok((value, read)) if read == bytes.len() => Some(Bincoded(value)),
            _ => None,
        }
    }

    fn encode(&self) -> Option<Vec<u8>> {
        bincode::encode_to_vec(&self.0, config::standard()).ok()
    }
}
