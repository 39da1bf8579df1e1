use std::path::Path;

use snafu::prelude::*;
use tracing::info;

use crate::config::Settings;
use crate::container::{Container, Entry};
use crate::ext::BestEffortPathExt;
use crate::storage::{PackageFormat, StorageError, load_package, save_package};
use crate::tree::{NodeId, StructuralError, Tree};
use crate::write_back::{FlushPolicy, FlushReport};

const DEFAULT_ROOT_KEY: &str = "document";

/// A node tree rooted at one directory, backed by a package on disk.
#[derive(Debug)]
pub struct Document {
    tree: Tree,
    root: NodeId,
}

impl Document {
    /// An empty document whose root directory is named `key`.
    pub fn new(key: impl Into<String>, policy: FlushPolicy) -> Result<Self, DocumentError> {
        Self::from_entry(key, &Entry::directory(), policy)
    }

    pub fn from_entry(
        key: impl Into<String>,
        entry: &Entry,
        policy: FlushPolicy,
    ) -> Result<Self, DocumentError> {
        let mut tree = Tree::with_policy(policy);
        let root = tree.import(key, entry).context(StructureSnafu)?;
        Ok(Self { tree, root })
    }

    /// Loads the package at `path`, detecting its format.
    pub async fn open(path: &Path, settings: &Settings) -> Result<Self, DocumentError> {
        let format = PackageFormat::detect(path);
        info!(
            "Opening {} package {}",
            format,
            path.best_effort_path_display()
        );
        let entry = load_package(path, format).await.context(StorageSnafu)?;
        Self::from_entry(root_key(path), &entry, settings.flush_policy)
    }

    /// Flushes the whole tree and writes it back as the package at `path`.
    ///
    /// A directory package is made to match the tree exactly: entries on
    /// disk that are no longer part of the document are removed.
    pub async fn save(
        &mut self,
        path: &Path,
        format: PackageFormat,
        settings: &Settings,
    ) -> Result<FlushReport, DocumentError> {
        self.write(path, format, settings, true).await
    }

    /// Flushes the whole tree and writes it to `path` without deleting
    /// anything already there.
    pub async fn export(
        &mut self,
        path: &Path,
        format: PackageFormat,
        settings: &Settings,
    ) -> Result<FlushReport, DocumentError> {
        self.write(path, format, settings, false).await
    }

    async fn write(
        &mut self,
        path: &Path,
        format: PackageFormat,
        settings: &Settings,
        prune: bool,
    ) -> Result<FlushReport, DocumentError> {
        let (entry, report) = self
            .tree
            .flush_with_report::<Entry>(self.root)
            .context(StructureSnafu)?;
        save_package(path, format, &entry, settings.compression_level, prune)
            .await
            .context(StorageSnafu)?;
        info!(
            "Saved {} package {}",
            format,
            path.best_effort_path_display()
        );
        Ok(report)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Resolves a slash-separated path below the root.
    pub fn node(&self, path: &str) -> Result<Option<NodeId>, DocumentError> {
        self.tree.resolve(self.root, path).context(StructureSnafu)
    }

    /// The text payload at `path`; `None` when missing or not UTF-8.
    pub fn read_text(&self, path: &str) -> Result<Option<&str>, DocumentError> {
        let Some(id) = self.node(path)? else {
            return Ok(None);
        };
        Ok(self.tree.payload::<String>(id).map(String::as_str))
    }

    /// Sets the text at `path`, creating the file and any missing parent
    /// directories. Existing files are updated through their cached payload
    /// and become dirty.
    pub fn write_text(&mut self, path: &str, text: &str) -> Result<NodeId, DocumentError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let (&name, parents) = segments.split_last().context(EmptyPathSnafu)?;

        let mut directory = self.root;
        for &segment in parents {
            directory = match self.tree.child(directory, segment).context(StructureSnafu)? {
                Some(existing) => existing,
                None => {
                    let created = self
                        .tree
                        .create_directory(segment, Vec::new())
                        .context(StructureSnafu)?;
                    self.tree.insert(directory, created).context(StructureSnafu)?;
                    created
                }
            };
        }

        match self.tree.child(directory, name).context(StructureSnafu)? {
            Some(existing) => {
                let updated = self
                    .tree
                    .update_payload::<String, _>(existing, |current| {
                        current.clear();
                        current.push_str(text);
                    })
                    .context(StructureSnafu)?;
                ensure!(updated.is_some(), NotTextSnafu { path });
                Ok(existing)
            }
            None => {
                let file = self
                    .tree
                    .create_file_with_contents(name, text)
                    .context(StructureSnafu)?;
                self.tree.insert(directory, file).context(StructureSnafu)?;
                Ok(file)
            }
        }
    }
}

fn root_key(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(DEFAULT_ROOT_KEY)
        .to_string()
}

#[derive(Debug, Snafu)]
pub enum DocumentError {
    #[snafu(display("Failed to access the package"))]
    StorageError { source: StorageError },
    #[snafu(display("Invalid document structure operation"))]
    StructureError { source: StructuralError },
    #[snafu(display("A node path must name at least one entry"))]
    EmptyPath,
    #[snafu(display("Node '{}' does not hold text", path))]
    NotText { path: String },
}
