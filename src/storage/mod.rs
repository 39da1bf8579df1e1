//! Persisted package formats: plain directories and single-file archives.

mod archive;
mod format;
mod package;
mod package_directory;

pub use archive::{Archive, ArchiveError};
pub use format::{ARCHIVE_EXTENSION, PackageFormat};
pub use package::{StorageError, load_package, save_package};
pub use package_directory::{PackageDirectory, PackageError, SaveSummary};
