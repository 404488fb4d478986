//! Command-line definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Predictive customer-to-agent routing over queue snapshots
#[derive(Parser, Debug)]
#[command(name = "qroute", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML); defaults to the user config directory
    #[arg(long, global = true, env = "QROUTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Include source file and line in log events
    #[arg(long, global = true)]
    pub log_source: bool,

    /// Log span open/close events, e.g. around each routing pass
    #[arg(long, global = true)]
    pub log_spans: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one routing pass over the snapshots and print the assignments
    Route {
        #[command(flatten)]
        snapshots: SnapshotArgs,

        /// Scoring model artifact (JSON)
        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Print the full customer x agent score matrix
    Score {
        #[command(flatten)]
        snapshots: SnapshotArgs,

        /// Scoring model artifact (JSON)
        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Describe the predictor that would be used
    ModelInfo {
        /// Scoring model artifact (JSON)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[derive(clap::Args, Debug)]
pub struct SnapshotArgs {
    /// Agents snapshot (JSON array)
    #[arg(long)]
    pub agents: PathBuf,

    /// Waiting customers snapshot (JSON array, in enqueue order)
    #[arg(long)]
    pub customers: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
