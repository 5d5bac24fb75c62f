//! Dispatches parsed CLI commands.

use super::handlers::{MigrateCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;
use crate::error::{AppError, AppResult};

/// What `main` should do after a command has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Start the HTTP server with the merged settings
    StartServer,
    /// The command finished; exit
    Done,
}

/// Runs one-shot commands and reports whether the server should start.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<CommandOutcome> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    match &cli.command {
        Some(Commands::Serve { dry_run: true, .. }) => {
            ServeCommandHandler::new(settings).validate_only()?;
            Ok(CommandOutcome::Done)
        }
        Some(Commands::Serve { .. }) | None => Ok(CommandOutcome::StartServer),
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings)
                .execute(*dry_run, *rollback)
                .await?;
            Ok(CommandOutcome::Done)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use clap::Parser;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/mortgage".to_string();
        config.jwt.secret = "s".repeat(32);
        config
    }

    #[tokio::test]
    async fn test_serve_dry_run_finishes() {
        let cli = Cli::try_parse_from(["mortgage-rs", "serve", "--dry-run"]).unwrap();
        let outcome = execute_command(&cli, valid_config()).await.unwrap();
        assert_eq!(outcome, CommandOutcome::Done);
    }

    #[tokio::test]
    async fn test_serve_and_default_start_server() {
        for args in [vec!["mortgage-rs", "serve"], vec!["mortgage-rs"]] {
            let cli = Cli::try_parse_from(args).unwrap();
            let outcome = execute_command(&cli, valid_config()).await.unwrap();
            assert_eq!(outcome, CommandOutcome::StartServer);
        }
    }

    #[tokio::test]
    async fn test_migrate_on_memory_backend_is_rejected() {
        let cli = Cli::try_parse_from(["mortgage-rs", "migrate"]).unwrap();
        let mut config = valid_config();
        config.database.backend = StorageBackend::Memory;

        let result = execute_command(&cli, config).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }
}
