//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::StorageBackend;

/// Mortgage calculation, rate comparison and application server
#[derive(Parser, Debug)]
#[command(name = "mortgage-rs")]
#[command(about = "Mortgage calculation, rate comparison and application server")]
#[command(long_about = "
mortgage-rs prices home loans, compares bank rates and records mortgage
applications behind a JSON API.

EXAMPLES:
    # Start the server with the layered configuration in ./config
    mortgage-rs serve

    # Run against in-memory stores seeded from a reference-data file
    mortgage-rs serve --storage memory --reference-data config/reference-data.toml

    # Use a single configuration file
    mortgage-rs --config /etc/mortgage-rs/production.toml serve

    # Check configuration without starting the server
    mortgage-rs serve --dry-run

    # Apply, preview or roll back database migrations
    mortgage-rs migrate
    mortgage-rs migrate --dry-run
    mortgage-rs migrate --rollback 1
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Single configuration file replacing the layered `config/` directory
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Environment layer to load instead of `MORTGAGE_APP_ENV`
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Address to bind, e.g. 127.0.0.1 or 0.0.0.0
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// TCP port to listen on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level for this run; wins over --verbose and --quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Storage backend override
        #[arg(long, value_enum)]
        storage: Option<Storage>,

        /// Banks and rates for the memory backend
        #[arg(long, value_name = "FILE", value_parser = super::validation::validate_reference_data_path)]
        reference_data: Option<PathBuf>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    Migrate {
        /// List pending migrations without applying them
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Revert the given number of most recent migrations (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    #[value(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Storage {
    Postgres,
    Memory,
}

impl Cli {
    /// Argument checks clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(Commands::Serve {
            storage,
            reference_data,
            ..
        }) = &self.command
            && reference_data.is_some()
            && *storage == Some(Storage::Postgres)
        {
            return Err("--reference-data only applies to --storage memory".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}

impl From<Storage> for StorageBackend {
    fn from(storage: Storage) -> Self {
        match storage {
            Storage::Postgres => StorageBackend::Postgres,
            Storage::Memory => StorageBackend::Memory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["mortgage-rs", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["mortgage-rs"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.env.is_none());
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from([
            "mortgage-rs",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--storage",
            "memory",
        ])
        .unwrap();

        let Some(Commands::Serve {
            host,
            port,
            storage,
            dry_run,
            ..
        }) = cli.command
        else {
            panic!("Expected Serve command");
        };
        assert_eq!(host.as_deref(), Some("0.0.0.0"));
        assert_eq!(port, Some(8080));
        assert_eq!(storage, Some(Storage::Memory));
        assert!(!dry_run);
    }

    #[test]
    fn test_env_aliases() {
        let cli = Cli::try_parse_from(["mortgage-rs", "--env", "stage"]).unwrap();
        assert_eq!(cli.env, Some(Environment::Staging));
        let cli = Cli::try_parse_from(["mortgage-rs", "-e", "prod"]).unwrap();
        assert_eq!(cli.env, Some(Environment::Production));
    }

    #[test]
    fn test_migrate_flags_conflict() {
        let cli = Cli::try_parse_from(["mortgage-rs", "migrate", "--dry-run"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Migrate { dry_run: true, rollback: None })
        ));

        let err = Cli::try_parse_from(["mortgage-rs", "migrate", "--dry-run", "--rollback", "2"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_conflicting_verbose_quiet() {
        let err = Cli::try_parse_from(["mortgage-rs", "--verbose", "--quiet"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_reference_data_requires_memory_storage() {
        let cli = Cli {
            command: Some(Commands::Serve {
                host: None,
                port: None,
                log_level: None,
                storage: Some(Storage::Postgres),
                reference_data: Some(PathBuf::from("config/reference-data.toml")),
                dry_run: false,
            }),
            config: None,
            env: None,
            verbose: false,
            quiet: false,
        };
        assert!(cli.validate().is_err());
    }
}
