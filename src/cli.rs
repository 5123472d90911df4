// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dagsched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagsched",
    version,
    about = "Simulate DAG job scheduling on a worker cluster.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workload file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Workload.toml")]
    pub workload: String,

    /// Number of independent episodes to run.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub episodes: usize,

    /// Base RNG seed; episode `i` uses `seed + i`.
    ///
    /// If omitted, `[config].seed` from the workload is used.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Truncate episodes once simulated time would pass this bound.
    #[arg(long, value_name = "T")]
    pub max_wall_time: Option<f64>,

    /// Cap on workers the baseline agent offers per decision.
    #[arg(long, value_name = "N")]
    pub parallelism: Option<usize>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the workload, but don't simulate.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
