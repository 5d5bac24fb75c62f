//! Merges CLI overrides into file-based configuration.
//!
//! Precedence, lowest first: configuration files, `MORTGAGE_*` variables,
//! global flags (`--verbose`/`--quiet`), command flags.

use std::path::Path;

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the unvalidated base configuration for this invocation.
    ///
    /// `--config` selects a single file; otherwise the layered loader is used.
    /// `--env` replaces `MORTGAGE_APP_ENV` when picking the environment layer.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let loader = match cli.config.as_deref() {
            Some(path) => Self::file_loader(path)?,
            None => ConfigLoader::new()?,
        };
        let loader = match cli.env {
            Some(env) => loader.with_environment(env.into()),
            None => loader,
        };

        Ok(Self::new(loader.load_unvalidated()?))
    }

    fn file_loader(path: &Path) -> Result<ConfigLoader, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::validation(
                "config_file".to_string(),
                format!("Configuration file does not exist: '{}'", path.display()),
            ));
        }
        Ok(ConfigLoader::from_file(path))
    }

    /// Applies CLI overrides and validates the result.
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            apply_command_overrides(&mut config, command);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

fn apply_command_overrides(config: &mut Settings, command: &Commands) {
    match command {
        Commands::Serve {
            host,
            port,
            log_level,
            storage,
            reference_data,
            dry_run: _,
        } => {
            if let Some(host) = host {
                config.server.host = host.clone();
            }
            if let Some(port) = port {
                config.server.port = *port;
            }
            if let Some(level) = log_level {
                config.logger.level = level.as_str().to_string();
            }
            if let Some(storage) = storage {
                config.database.backend = (*storage).into();
            }
            if let Some(path) = reference_data {
                config.mortgage.reference_data = Some(path.display().to_string());
            }
        }
        Commands::Migrate { .. } => {}
    }
}
