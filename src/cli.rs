//! CLI definitions for Watchkeeper.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Watchkeeper CLI.
#[derive(Parser)]
#[command(name = "watchkeeper")]
#[command(about = "Unattended health monitoring and auto-recovery agent")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        env = "WATCHKEEPER_CONFIG",
        default_value = "/etc/watchkeeper/watchkeeper.toml",
        global = true
    )]
    pub config: PathBuf,

    /// Log alerts instead of sending them; record nothing and restart nothing
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub(crate) enum Commands {
    /// Run one monitoring invocation (default)
    Run,

    /// Sample and evaluate, print the result, change nothing
    Check {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Send a health summary, bypassing deduplication
    Report,

    /// Run the retention pass only
    Retain,

    /// Validate the configuration and exit
    Validate,
}
