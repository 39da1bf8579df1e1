use std::hash::Hasher;

use derive_more::Display;
use metrohash::MetroHash64;

use crate::container::Entry;

const FILE_TAG: u8 = 0;
const DIRECTORY_TAG: u8 = 1;

/// MetroHash64 digest of raw bytes or of a whole entry tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display("{_0:016x}")]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut hasher = MetroHash64::default();
        hasher.write(bytes);
        Fingerprint(hasher.finish())
    }

    /// Digest covering names, kinds and contents of every entry.
    pub fn of_entry(entry: &Entry) -> Self {
        let mut hasher = MetroHash64::default();
        hash_entry(&mut hasher, entry);
        Fingerprint(hasher.finish())
    }

    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn from_value(value: u64) -> Self {
        Fingerprint(value)
    }
}

fn hash_entry(hasher: &mut MetroHash64, entry: &Entry) {
    match entry {
        Entry::File(contents) => {
            hasher.write_u8(FILE_TAG);
            hasher.write_u64(contents.len() as u64);
            hasher.write(contents);
        }
        Entry::Directory(entries) => {
            hasher.write_u8(DIRECTORY_TAG);
            hasher.write_u64(entries.len() as u64);
            for (name, child) in entries {
                hasher.write_u64(name.len() as u64);
                hasher.write(name.as_bytes());
                hash_entry(hasher, child);
            }
        }
    }
}
