//! Serve command handler: configuration dry-run.

use crate::config::StorageBackend;
use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::repositories::ReferenceData;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Validates configuration and, for the memory backend, the reference
    /// data, then prints what the server would do.
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        println!("✓ Configuration is valid");
        println!("✓ Server would bind to: {}", self.config.server.address());

        match self.config.database.backend {
            StorageBackend::Postgres => {
                println!("✓ Storage: postgres (auto_migrate = {})", self.config.database.auto_migrate);
            }
            StorageBackend::Memory => match &self.config.mortgage.reference_data {
                Some(path) => {
                    let data = ReferenceData::load(path)?;
                    println!(
                        "✓ Storage: memory, {} bank(s) and {} rate(s) from {}",
                        data.banks.len(),
                        data.rates.len(),
                        path
                    );
                }
                None => println!("✓ Storage: memory, no reference data configured"),
            },
        }

        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/mortgage".to_string();
        config.jwt.secret = "s".repeat(32);
        config
    }

    #[test]
    fn test_dry_run_valid_config() {
        let handler = ServeCommandHandler::new(valid_config());
        assert!(handler.validate_only().is_ok());
        assert_eq!(handler.config().server.port, 3000);
    }

    #[test]
    fn test_dry_run_invalid_port() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(ServeCommandHandler::new(config).validate_only().is_err());
    }

    #[test]
    fn test_dry_run_checks_reference_data() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[banks]]
id = 1
code = "HSB"
name = "Harbour Savings"
is_active = true

[[rates]]
id = 1
bank_id = 2
rate_type = "fixed"
interest_rate = 3.0
effective_date = "2026-01-01T00:00:00Z"
"#
        )
        .unwrap();

        let mut config = valid_config();
        config.database.backend = StorageBackend::Memory;
        config.mortgage.reference_data = Some(file.path().display().to_string());

        // rate 1 points at an unknown bank
        assert!(ServeCommandHandler::new(config).validate_only().is_err());
    }
}
