//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Neurowire - biosignal telemetry pipeline
#[derive(Parser, Debug)]
#[command(
    name = "neurowire",
    author,
    version,
    about = "Biosignal telemetry ingestion and export pipeline",
    long_about = "Ingests compressed biosignal device frames, maintains live \n\
                  per-subject signal windows for analysis, and exports stored \n\
                  recordings as packaged datasets."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "NEUROWIRE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "NEUROWIRE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion pipeline with mock devices
    Run(RunArgs),

    /// Export a dataset as a packaged archive
    Export(ExportArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "NEUROWIRE_CONFIG")]
    pub config: PathBuf,

    /// Data directory for stored chunks and metadata
    #[arg(long, default_value = "data", env = "NEUROWIRE_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Number of mock devices to run
    #[arg(long, default_value = "2", env = "NEUROWIRE_DEVICES")]
    pub devices: usize,

    /// Number of ingest consumers draining the queue
    #[arg(long, default_value = "2", env = "NEUROWIRE_CONSUMERS")]
    pub consumers: usize,

    /// Pipeline run duration in seconds (0 = until shutdown signal)
    #[arg(long, default_value = "0", env = "NEUROWIRE_DURATION")]
    pub duration: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "NEUROWIRE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `export` command
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "NEUROWIRE_CONFIG")]
    pub config: PathBuf,

    /// Data directory holding stored chunks and metadata
    #[arg(long, default_value = "data", env = "NEUROWIRE_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Dataset identifier to export
    #[arg(short, long)]
    pub dataset: String,

    /// Status poll interval in milliseconds
    #[arg(long, default_value = "500")]
    pub poll_interval_ms: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
