use std::path::Path;

use derive_more::Display;

pub const ARCHIVE_EXTENSION: &str = "folio";

/// On-disk shape of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PackageFormat {
    #[display("directory")]
    Directory,
    #[display("archive")]
    Archive,
}

impl PackageFormat {
    /// Existing directories are directory packages and existing files are
    /// archives. A path that does not exist yet is an archive when it carries
    /// the `.folio` extension.
    pub fn detect(path: &Path) -> Self {
        if path.is_dir() {
            PackageFormat::Directory
        } else if path.is_file() {
            PackageFormat::Archive
        } else if path
            .extension()
            .is_some_and(|extension| extension == ARCHIVE_EXTENSION)
        {
            PackageFormat::Archive
        } else {
            PackageFormat::Directory
        }
    }
}
