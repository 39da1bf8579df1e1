/// Minimal capability set of a hierarchical byte container.
///
/// A container is either a file holding raw bytes or a directory holding
/// named sub-containers. The tree imports from and flushes into any type
/// implementing this trait.
pub trait Container: Sized {
    /// A fresh file container holding `contents`.
    fn file(contents: Vec<u8>) -> Self;

    /// A fresh, empty directory container.
    fn directory() -> Self;

    fn is_directory(&self) -> bool;

    /// Raw bytes of a file container, `None` for directories.
    fn contents(&self) -> Option<&[u8]>;

    /// Named entries of a directory container, `None` for files.
    fn entries(&self) -> Option<Box<dyn Iterator<Item = (&str, &Self)> + '_>>;

    /// Adds or replaces the entry `name`, returning the replaced entry.
    ///
    /// File containers cannot hold entries; the entry is handed back as
    /// `Err`.
    fn insert_entry(&mut self, name: String, entry: Self) -> Result<Option<Self>, Self>;

    /// Removes the entry `name` from a directory container.
    fn remove_entry(&mut self, name: &str) -> Option<Self>;
}

/// Whether `name` can be used as a single on-disk path component.
///
/// Empty names, `.`, `..` and names holding a path separator are rejected
/// so a stored tree never reaches outside its package.
pub fn is_valid_entry_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
