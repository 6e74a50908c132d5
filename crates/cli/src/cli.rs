//! CLI argument parsing with clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Concurrent building blocks with a checkpointed model-test harness
#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Use specific config file
    #[arg(short = 'C', long = "config", global = true, env = "WEFT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a checkpointed model-test suite via the external test tool
    Model(ModelArgs),
    /// Initialize weft configuration
    Init(InitArgs),
}

#[derive(clap::Args)]
pub struct ModelArgs {
    /// Named suite from weft.toml (omit to use the [model] defaults)
    #[arg(value_name = "SUITE")]
    pub suite: Option<String>,

    /// Checkpoint interval forwarded to the external tool
    #[arg(long, value_name = "N")]
    pub interval: Option<u64>,

    /// Checkpoint file path forwarded to the external tool
    #[arg(long = "checkpoint-file", value_name = "PATH")]
    pub checkpoint_file: Option<String>,

    /// Feature set to enable (comma-separated)
    #[arg(long, value_name = "FEATURES", value_delimiter = ',')]
    pub features: Option<Vec<String>>,

    /// Test target (compiled test binary) to run
    #[arg(long, value_name = "NAME")]
    pub target: Option<String>,

    /// Test-name filter passed through to the tool
    #[arg(long, value_name = "PATTERN")]
    pub filter: Option<String>,

    /// Number of test threads inside the tool
    #[arg(long = "test-threads", value_name = "N")]
    pub test_threads: Option<usize>,

    /// Build the tests with optimizations (config default: on)
    #[arg(long, conflicts_with = "debug")]
    pub release: bool,

    /// Build the tests without optimizations
    #[arg(long)]
    pub debug: bool,

    /// Let the test harness capture output (config default: unbuffered)
    #[arg(long)]
    pub capture: bool,

    /// External tool to invoke
    #[arg(long, env = "WEFT_CARGO", value_name = "BIN")]
    pub tool: Option<String>,

    /// Directory to launch the tool from
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Print the constructed command line without launching it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(clap::Args)]
pub struct InitArgs {
    /// Overwrite existing config
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
