use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use compio::fs;
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::container::{Container, Entry, Fingerprint, is_valid_entry_name};
use crate::ext::BestEffortPathExt;

/// Counters collected while saving a package directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub written: usize,
    pub unchanged: usize,
    pub removed: usize,
}

/// A package stored as a plain directory tree on disk.
#[derive(Debug, Clone)]
pub struct PackageDirectory {
    root: PathBuf,
    prune: bool,
}

impl PackageDirectory {
    /// A package at `root` that owns the whole directory: saving removes
    /// anything not part of the saved tree.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prune: true,
        }
    }

    /// Controls whether `save` deletes on-disk entries missing from the
    /// saved tree. Without pruning, foreign files are left alone and an
    /// entry whose kind differs from what is on disk is an error.
    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the whole directory into an entry tree.
    pub async fn load(&self) -> Result<Entry, PackageError> {
        let metadata = fs::metadata(&self.root)
            .await
            .context(MetadataSnafu { path: &self.root })?;
        ensure!(
            metadata.is_dir(),
            NotADirectorySnafu { path: &self.root }
        );

        let entry = load_entry(self.root.clone()).await?;
        info!(
            "Loaded package {}: {} files, {} bytes",
            self.root.best_effort_path_display(),
            entry.file_count(),
            entry.total_size()
        );
        Ok(entry)
    }

    /// Writes `entry` to disk.
    ///
    /// Files whose contents already match are left untouched. Entry names
    /// are checked before anything below them is written.
    pub async fn save(&self, entry: &Entry) -> Result<SaveSummary, PackageError> {
        ensure!(
            entry.is_directory(),
            RootNotDirectorySnafu { path: &self.root }
        );

        let mut summary = SaveSummary::default();
        save_entry(self.root.clone(), entry, self.prune, &mut summary).await?;
        info!(
            "Saved package {}: {} written, {} unchanged, {} removed",
            self.root.best_effort_path_display(),
            summary.written,
            summary.unchanged,
            summary.removed
        );
        Ok(summary)
    }
}

/// Metadata of `path`, `None` when nothing exists there.
async fn existing_metadata(path: &Path) -> Result<Option<fs::Metadata>, PackageError> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(source).context(MetadataSnafu { path }),
    }
}

fn load_entry(path: PathBuf) -> LocalBoxFuture<'static, Result<Entry, PackageError>> {
    async move {
        let metadata = fs::metadata(&path)
            .await
            .context(MetadataSnafu { path: &path })?;
        if !metadata.is_dir() {
            let contents = fs::read(&path).await.context(ReadFileSnafu { path: &path })?;
            return Ok(Entry::File(contents));
        }

        let mut entries = BTreeMap::new();
        for child_path in list_dir(&path)? {
            let name = child_path
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .context(NonUtf8NameSnafu { path: &child_path })?;
            let child = load_entry(child_path).await?;
            entries.insert(name, child);
        }
        debug!(
            "Loaded directory {} with {} entries",
            path.best_effort_path_display(),
            entries.len()
        );
        Ok(Entry::Directory(entries))
    }
    .boxed_local()
}

fn save_entry<'a>(
    path: PathBuf,
    entry: &'a Entry,
    prune: bool,
    summary: &'a mut SaveSummary,
) -> LocalBoxFuture<'a, Result<(), PackageError>> {
    async move {
        let existing = existing_metadata(&path).await?;
        match entry {
            Entry::File(contents) => {
                match existing {
                    Some(metadata) if metadata.is_dir() => {
                        ensure!(prune, KindConflictSnafu { path: &path });
                        remove_path(path.clone()).await?;
                        summary.removed += 1;
                    }
                    Some(_) => {
                        let current = fs::read(&path).await.context(ReadFileSnafu { path: &path })?;
                        if Fingerprint::of_bytes(&current) == Fingerprint::of_bytes(contents) {
                            summary.unchanged += 1;
                            return Ok(());
                        }
                    }
                    None => {}
                }
                debug!(
                    "Writing {} bytes to {}",
                    contents.len(),
                    path.best_effort_path_display()
                );
                let res = fs::write(&path, contents.clone()).await;
                res.0.context(WriteFileSnafu { path: &path })?;
                summary.written += 1;
            }
            Entry::Directory(entries) => {
                for name in entries.keys() {
                    ensure!(
                        is_valid_entry_name(name),
                        InvalidEntryNameSnafu {
                            path: &path,
                            name
                        }
                    );
                }
                if existing.is_some_and(|metadata| !metadata.is_dir()) {
                    ensure!(prune, KindConflictSnafu { path: &path });
                    fs::remove_file(&path)
                        .await
                        .context(RemoveSnafu { path: &path })?;
                    summary.removed += 1;
                }
                fs::create_dir_all(&path)
                    .await
                    .context(CreateDirSnafu { path: &path })?;
                if prune {
                    summary.removed += remove_stale(&path, entries).await?;
                }
                for (name, child) in entries {
                    save_entry(path.join(name), child, prune, summary).await?;
                }
            }
        }
        Ok(())
    }
    .boxed_local()
}

/// Child paths of a directory. compio has no directory listing, so this
/// goes through `std::fs`.
fn list_dir(path: &Path) -> Result<Vec<PathBuf>, PackageError> {
    std::fs::read_dir(path)
        .context(ReadDirSnafu { path })?
        .map(|dir_entry| {
            dir_entry
                .map(|dir_entry| dir_entry.path())
                .context(ReadDirSnafu { path })
        })
        .collect()
}

/// Deletes everything in `path` that has no counterpart in `entries`.
async fn remove_stale(
    path: &Path,
    entries: &BTreeMap<String, Entry>,
) -> Result<usize, PackageError> {
    let mut removed = 0;
    for stale in list_dir(path)? {
        let keep = stale
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| entries.contains_key(name));
        if keep {
            continue;
        }

        debug!("Removing stale {}", stale.best_effort_path_display());
        remove_path(stale).await?;
        removed += 1;
    }
    Ok(removed)
}

/// Removes a file, or a directory together with everything below it.
fn remove_path(path: PathBuf) -> LocalBoxFuture<'static, Result<(), PackageError>> {
    async move {
        let metadata = fs::symlink_metadata(&path)
            .await
            .context(MetadataSnafu { path: &path })?;
        if metadata.is_dir() {
            for child in list_dir(&path)? {
                remove_path(child).await?;
            }
            fs::remove_dir(&path)
                .await
                .context(RemoveSnafu { path: &path })?;
        } else {
            fs::remove_file(&path)
                .await
                .context(RemoveSnafu { path: &path })?;
        }
        Ok(())
    }
    .boxed_local()
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PackageError {
    #[snafu(display("Failed to inspect {}", path.best_effort_path_display()))]
    MetadataError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Package path {} is not a directory", path.best_effort_path_display()))]
    NotADirectory { path: PathBuf },
    #[snafu(display("Cannot save a file entry as package {}", path.best_effort_path_display()))]
    RootNotDirectory { path: PathBuf },
    #[snafu(display(
        "Entry '{}' in {} is not a valid path component",
        name,
        path.best_effort_path_display()
    ))]
    InvalidEntryName { path: PathBuf, name: String },
    #[snafu(display(
        "{} already exists with a different kind",
        path.best_effort_path_display()
    ))]
    KindConflict { path: PathBuf },
    #[snafu(display("Failed to list directory {}", path.best_effort_path_display()))]
    ReadDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to read file {}", path.best_effort_path_display()))]
    ReadFileError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to write file {}", path.best_effort_path_display()))]
    WriteFileError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to create directory {}", path.best_effort_path_display()))]
    CreateDirError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to remove {}", path.best_effort_path_display()))]
    RemoveError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Entry name of {} is not valid UTF-8", path.best_effort_path_display()))]
    NonUtf8Name { path: PathBuf },
}
