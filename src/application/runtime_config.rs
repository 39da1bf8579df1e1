use std::path::PathBuf;

use crate::cli::{Cli, Command};

/// What a single invocation was asked to do.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command: Command,
    /// Directory searched for the settings file when no explicit path is given.
    pub root: PathBuf,
    pub settings_path: Option<PathBuf>,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            command: cli.command,
            root: cli.root,
            settings_path: cli.config,
        }
    }
}
