//! Command-line interface for mortgage-rs
//!
//! - Argument parsing with clap
//! - Configuration merging (CLI args + config files)
//! - Handlers for the serve dry-run and migrate commands

pub mod config_merger;
pub mod executor;
pub mod handlers;
pub mod parser;
pub mod validation;

pub use config_merger::ConfigurationMerger;
pub use executor::{CommandOutcome, execute_command};
pub use parser::{Cli, Commands, Environment, LogLevel, Storage};

use crate::config::settings::Settings;
use crate::logger::init_logger;

/// Loads configuration files and applies the CLI overrides.
///
/// # Errors
/// Returns an error if loading, merging or validation fails.
pub fn load_and_merge_config(cli: &Cli) -> anyhow::Result<Settings> {
    let merger = ConfigurationMerger::from_cli(cli)
        .map_err(|e| anyhow::anyhow!("Configuration error: {e}"))?;

    merger
        .merge_cli_args(cli)
        .map_err(|e| anyhow::anyhow!("Configuration merge error: {e}"))
}

/// Installs the global tracing subscriber described by `settings.logger`.
pub fn init_logger_from_settings(settings: &Settings) -> anyhow::Result<()> {
    let logger_config = settings
        .logger
        .clone()
        .into_logger_config()
        .map_err(|e| anyhow::anyhow!("Logger configuration error: {e}"))?;

    init_logger(logger_config)
}
