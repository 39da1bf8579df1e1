use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::RuntimeConfig;
use crate::application::tree_view::{render_tree, stdout_supports_color};
use crate::cli::Command;
use crate::config::{Settings, SettingsError};
use crate::document::{Document, DocumentError};
use crate::storage::PackageFormat;
use crate::tree::StructuralError;

pub struct Application;

impl Application {
    /// Reads settings from the explicit path, or from the root directory.
    pub async fn load_settings(runtime: &RuntimeConfig) -> Result<Settings, ApplicationError> {
        let settings = match &runtime.settings_path {
            Some(path) => Settings::from_path(path.clone()).await,
            None => Settings::read(&runtime.root).await,
        }
        .context(SettingsSnafu)?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Runs the requested command and returns what should be printed.
    pub async fn run(
        runtime: impl Into<RuntimeConfig>,
        settings: &Settings,
    ) -> Result<String, ApplicationError> {
        let runtime: RuntimeConfig = runtime.into();
        match runtime.command {
            Command::Tree { package } => {
                let document = Document::open(&package, settings)
                    .await
                    .context(DocumentSnafu)?;
                render_tree(document.tree(), document.root(), stdout_supports_color())
                    .context(StructureSnafu)
            }
            Command::Pack { source, archive } => {
                let mut document = Document::open(&source, settings)
                    .await
                    .context(DocumentSnafu)?;
                document
                    .export(&archive, PackageFormat::Archive, settings)
                    .await
                    .context(DocumentSnafu)?;
                Ok(format!("Packed into {}", archive.display()))
            }
            Command::Unpack {
                archive,
                destination,
            } => {
                let mut document = Document::open(&archive, settings)
                    .await
                    .context(DocumentSnafu)?;
                document
                    .export(&destination, PackageFormat::Directory, settings)
                    .await
                    .context(DocumentSnafu)?;
                Ok(format!("Unpacked into {}", destination.display()))
            }
            Command::Cat { package, node } => {
                let document = Document::open(&package, settings)
                    .await
                    .context(DocumentSnafu)?;
                let id = document
                    .node(&node)
                    .context(DocumentSnafu)?
                    .context(MissingNodeSnafu { path: &node })?;
                let text = document
                    .tree()
                    .payload::<String>(id)
                    .context(UnreadableNodeSnafu { path: &node })?;
                Ok(text.clone())
            }
            Command::Put {
                package,
                node,
                text,
            } => {
                let mut document = Document::open(&package, settings)
                    .await
                    .context(DocumentSnafu)?;
                document.write_text(&node, &text).context(DocumentSnafu)?;
                let report = document
                    .save(&package, PackageFormat::detect(&package), settings)
                    .await
                    .context(DocumentSnafu)?;
                info!("Flush report: {:?}", report);
                Ok(format!(
                    "Wrote {node}: {} nodes flushed, {} written",
                    report.visited, report.written
                ))
            }
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while reading settings"))]
    SettingsError { source: SettingsError },
    #[snafu(display("Critical failure encountered while processing the document"))]
    DocumentError { source: DocumentError },
    #[snafu(display("Failed to walk the document tree"))]
    StructureError { source: StructuralError },
    #[snafu(display("No node at '{}'", path))]
    MissingNode { path: String },
    #[snafu(display("Node '{}' is a directory or does not hold text", path))]
    UnreadableNode { path: String },
}
