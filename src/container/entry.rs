use std::collections::BTreeMap;

use bincode::{Decode, Encode};

use crate::container::{Container, is_valid_entry_name};

/// In-memory container: a named tree of byte blobs.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Entry {
    File(Vec<u8>),
    Directory(BTreeMap<String, Entry>),
}

impl Entry {
    /// Looks up a descendant by a slash-separated path.
    pub fn get(&self, path: &str) -> Option<&Entry> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |entry, segment| match entry {
                Entry::Directory(entries) => entries.get(segment),
                Entry::File(_) => None,
            })
    }

    /// Number of file entries in this tree.
    pub fn file_count(&self) -> usize {
        match self {
            Entry::File(_) => 1,
            Entry::Directory(entries) => entries.values().map(Entry::file_count).sum(),
        }
    }

    /// Slash-separated path of the first entry whose name is not a valid
    /// path component, if any.
    pub fn find_invalid_name(&self) -> Option<String> {
        let Entry::Directory(entries) = self else {
            return None;
        };
        entries.iter().find_map(|(name, entry)| {
            if !is_valid_entry_name(name) {
                return Some(name.clone());
            }
            entry
                .find_invalid_name()
                .map(|nested| format!("{name}/{nested}"))
        })
    }

    /// Total size of all file contents in this tree.
    pub fn total_size(&self) -> u64 {
        match self {
            Entry::File(contents) => contents.len() as u64,
            Entry::Directory(entries) => entries.values().map(Entry::total_size).sum(),
        }
    }
}

impl Container for Entry {
    fn file(contents: Vec<u8>) -> Self {
        Entry::File(contents)
    }

    fn directory() -> Self {
        Entry::Directory(BTreeMap::new())
    }

    fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    fn contents(&self) -> Option<&[u8]> {
        match self {
            Entry::File(contents) => Some(contents.as_slice()),
            Entry::Directory(_) => None,
        }
    }

    fn entries(&self) -> Option<Box<dyn Iterator<Item = (&str, &Self)> + '_>> {
        match self {
            Entry::Directory(entries) => Some(Box::new(
                entries.iter().map(|(name, entry)| (name.as_str(), entry)),
            )),
            Entry::File(_) => None,
        }
    }

    fn insert_entry(&mut self, name: String, entry: Self) -> Result<Option<Self>, Self> {
        match self {
            Entry::Directory(entries) => Ok(entries.insert(name, entry)),
            Entry::File(_) => Err(entry),
        }
    }

    fn remove_entry(&mut self, name: &str) -> Option<Self> {
        match self {
            Entry::Directory(entries) => entries.remove(name),
            Entry::File(_) => None,
        }
    }
}
