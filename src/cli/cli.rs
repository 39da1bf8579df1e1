use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::data::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Overrides the log level from the settings file
    #[clap(long, short, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Settings file to use instead of folio.yaml in the root directory
    #[clap(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Directory searched for folio.yaml
    #[clap(long, short, global = true, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the node tree of a package
    Tree { package: PathBuf },
    /// Write a package into a single archive file
    Pack { source: PathBuf, archive: PathBuf },
    /// Expand a package into a directory
    Unpack {
        archive: PathBuf,
        destination: PathBuf,
    },
    /// Print the text stored at a node
    Cat { package: PathBuf, node: String },
    /// Store text at a node, creating it if needed, and save the package
    Put {
        package: PathBuf,
        node: String,
        text: String,
    },
}
