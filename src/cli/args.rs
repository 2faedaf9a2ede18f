//! CLI argument definitions
//!
//! All Clap derive structs for `islandclash` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

// ============================================================================
// Root CLI
// ============================================================================

/// Territory, phase and hazard engine for five-team island matches.
#[derive(Parser, Debug)]
#[command(name = "islandclash", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "ISLANDCLASH_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(
        long,
        default_value = "human",
        global = true,
        env = "ISLANDCLASH_LOG_FORMAT"
    )]
    pub log_format: OutputFormat,
}

// ============================================================================
// Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Boot the engine and run the dispatch loop until stopped.
    Run(RunArgs),

    /// Validate configuration files without running a match.
    Validate(ValidateArgs),

    /// Show the persisted phase and team standings.
    Status(StatusArgs),

    /// Display version information.
    Version(VersionArgs),
}

/// Arguments for `run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML match configuration.
    #[arg(short, long, env = "ISLANDCLASH_CONFIG")]
    pub config: PathBuf,

    /// Document directory, overriding `storage.dir`.
    #[arg(long, env = "ISLANDCLASH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Write JSONL match events to this file instead of stderr.
    #[arg(long, env = "ISLANDCLASH_EVENTS_FILE")]
    pub events_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this port.
    #[arg(long, env = "ISLANDCLASH_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Fixed hazard RNG seed, overriding `hazards.seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop on its own after this long (e.g. `90s`, `1h`).
    #[arg(long, value_parser = humantime::parse_duration)]
    pub stop_after: Option<Duration>,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for `status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Document directory to read.
    #[arg(long, default_value = "./data", env = "ISLANDCLASH_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

// ============================================================================
// Tests
// ============================================================================
