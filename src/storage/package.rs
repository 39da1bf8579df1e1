use std::path::Path;

use snafu::prelude::*;

use crate::container::Entry;
use crate::storage::{Archive, ArchiveError, PackageDirectory, PackageError, PackageFormat};

/// Reads the package at `path` in the given format.
pub async fn load_package(path: &Path, format: PackageFormat) -> Result<Entry, StorageError> {
    match format {
        PackageFormat::Directory => PackageDirectory::new(path)
            .load()
            .await
            .context(DirectorySnafu),
        PackageFormat::Archive => Archive::read(path).await.context(ArchiveSnafu),
    }
}

/// Writes `entry` as a package at `path` in the given format.
///
/// `prune` only matters for directory packages: it removes whatever is on
/// disk but not in `entry`.
pub async fn save_package(
    path: &Path,
    format: PackageFormat,
    entry: &Entry,
    compression_level: i32,
    prune: bool,
) -> Result<(), StorageError> {
    match format {
        PackageFormat::Directory => PackageDirectory::new(path)
            .with_pruning(prune)
            .save(entry)
            .await
            .map(|_| ())
            .context(DirectorySnafu),
        PackageFormat::Archive => Archive::write(path, entry, compression_level)
            .await
            .context(ArchiveSnafu),
    }
}

#[derive(Debug, Snafu)]
pub enum StorageError {
    #[snafu(display("Directory package failure"))]
    DirectoryError { source: PackageError },
    #[snafu(display("Archive package failure"))]
    ArchiveError { source: ArchiveError },
}
