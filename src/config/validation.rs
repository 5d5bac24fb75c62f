//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use std::path::Path;

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, FileSettings, LoggerSettings, MortgageConfig, ServerConfig, Settings,
    StorageBackend,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Validate server configuration
    ///
    /// # Validation Rules
    /// - Port must be between 1 and 65535
    /// - Request timeout must be greater than 0
    /// - Keep-alive timeout must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        if self.request_timeout == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if self.keep_alive_timeout == 0 {
            return Err(ConfigError::validation(
                "server.keep_alive_timeout",
                "Keep-alive timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// The URL and pool bounds only matter for the postgres backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StorageBackend::Memory {
            return Ok(());
        }

        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !self.is_valid_database_url() {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }

    fn is_valid_database_url(&self) -> bool {
        ["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()
    }
}

/// `application_no` holds 32 characters; the date and suffix take 14.
const MAX_APPLICATION_NO_PREFIX_LEN: usize = 18;

impl MortgageConfig {
    /// Validate mortgage engine settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix_ok = !self.application_no_prefix.is_empty()
            && self
                .application_no_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric());
        if !prefix_ok {
            return Err(ConfigError::validation(
                "mortgage.application_no_prefix",
                "Application number prefix must be non-empty ASCII letters or digits.",
            ));
        }

        if self.application_no_prefix.len() > MAX_APPLICATION_NO_PREFIX_LEN {
            return Err(ConfigError::validation(
                "mortgage.application_no_prefix".to_string(),
                format!(
                    "Application number prefix must be at most {MAX_APPLICATION_NO_PREFIX_LEN} characters."
                ),
            ));
        }

        if self.application_no_max_attempts == 0 {
            return Err(ConfigError::validation(
                "mortgage.application_no_max_attempts",
                "At least one application number attempt is required.",
            ));
        }

        if self.schedule_preview_periods == 0 {
            return Err(ConfigError::validation(
                "mortgage.schedule_preview_periods",
                "Schedule preview must include at least one period.",
            ));
        }

        if let Some(path) = &self.reference_data
            && !Path::new(path).exists()
        {
            return Err(ConfigError::file_not_found(format!(
                "Reference data file not found: {}",
                path
            )));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.logger.validate()?;
        self.mortgage.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::JwtConfig;

    fn valid_settings() -> Settings {
        Settings {
            database: DatabaseConfig {
                url: "postgres://localhost/mortgage".to_string(),
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: "s".repeat(32),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_settings() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn test_server_config_invalid_port_zero() {
        let config = ServerConfig {
            port: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "server.port")
        );
    }

    #[test]
    fn test_server_config_invalid_request_timeout() {
        let config = ServerConfig {
            request_timeout: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "server.request_timeout")
        );
    }

    #[test]
    fn test_database_config_empty_url() {
        let config = DatabaseConfig::default();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "database.url")
        );
    }

    #[test]
    fn test_database_config_rejects_non_postgres_scheme() {
        let config = DatabaseConfig {
            url: "mysql://localhost/db".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_database_config_min_exceeds_max() {
        let config = DatabaseConfig {
            url: "postgres://localhost/db".to_string(),
            max_connections: 2,
            min_connections: 5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "database.min_connections")
        );
    }

    #[test]
    fn test_memory_backend_skips_url_checks() {
        let config = DatabaseConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_logger_invalid_level() {
        let settings = LoggerSettings {
            level: "verbose".to_string(),
            ..Default::default()
        };
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "logger.level")
        );
    }

    #[test]
    fn test_logger_file_enabled_requires_path() {
        let mut settings = LoggerSettings::default();
        settings.file.enabled = true;
        settings.file.path = "  ".to_string();
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "logger.file.path")
        );
    }

    #[test]
    fn test_mortgage_config_rejects_bad_prefix() {
        let config = MortgageConfig {
            application_no_prefix: "M-".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MortgageConfig {
            application_no_prefix: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MortgageConfig {
            application_no_prefix: "A".repeat(19),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { field, .. } if field == "mortgage.application_no_prefix"
        ));

        let config = MortgageConfig {
            application_no_prefix: "A".repeat(18),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mortgage_config_zero_attempts() {
        let config = MortgageConfig {
            application_no_max_attempts: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationError { field, .. } if field == "mortgage.application_no_max_attempts"
        ));
    }

    #[test]
    fn test_mortgage_config_missing_reference_data() {
        let config = MortgageConfig {
            reference_data: Some("/definitely/not/here.toml".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::FileNotFound(_)
        ));
    }

    #[test]
    fn test_settings_requires_jwt_secret() {
        let mut settings = valid_settings();
        settings.jwt.secret.clear();
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { field, .. } if field == "jwt.secret")
        );
    }
}
