//! Watchkeeper - unattended health monitoring and auto-recovery agent
//!
//! Main entry point. Each invocation is one-shot: a scheduler such as a
//! systemd timer or cron starts it periodically.

use clap::Parser;
use tracing::warn;

mod cli;
mod cmd_config;
mod cmd_monitor;
mod logging;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging settings live in the config, so it is loaded first.
    let (config, warnings) = cmd_config::load_config(&cli.config)?;
    let _guard = logging::init_tracing(&config.logging)?;

    for warning in &warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => cmd_monitor::run(&config, cli.dry_run).await,
        Commands::Check { json } => cmd_monitor::check(&config, json).await,
        Commands::Report => cmd_monitor::report(&config, cli.dry_run).await,
        Commands::Retain => cmd_monitor::retain(&config).await,
        Commands::Validate => {
            cmd_config::validate(&cli.config, &config, &warnings);
            Ok(())
        }
    }
}
