//! CLI definitions for partsync.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "partsync",
    version,
    about = "Replay and inspect mirrored viewer models",
    after_help = "Examples:\n  partsync replay session.json\n  partsync replay session.json --format messages --part Root.Frame\n  partsync inspect initial.json delta-1.json --format json"
)]
pub struct Cli {
    /// Show merge and projection details.
    #[arg(long, short, global = true)]
    pub verbose: bool,
    /// Configuration file (defaults to partsync.toml in the working directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Design key, overriding the configured one.
    #[arg(long, global = true)]
    pub design_key: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a recorded session and replay its property writes and actions.
    Replay {
        /// Recording file (JSON).
        recording: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Merge model data files in order and print the resulting tree.
    Inspect {
        /// Model data files (JSON); the first is the initial model.
        #[arg(required = true)]
        deltas: Vec<PathBuf>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, clap::Args)]
pub struct OutputArgs {
    /// What to print.
    #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
    pub format: OutputFormat,
    /// Restrict output to one part and its subtree.
    #[arg(long, value_name = "REF_CHAIN")]
    pub part: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Indented outline.
    Tree,
    /// Messages of the subtree, depth first.
    Messages,
    /// Tree as JSON.
    Json,
}
