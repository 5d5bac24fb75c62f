//! Migrate command handler: apply, preview or revert embedded migrations.

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;

use crate::config::StorageBackend;
use crate::config::settings::Settings;
use crate::db::{MIGRATIONS, run_pending_migrations};
use crate::error::{AppError, AppResult};

pub struct MigrateCommandHandler {
    config: Settings,
}

impl MigrateCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// # Errors
    /// - `Configuration` when the storage backend is not postgres
    /// - `Validation` for a rollback of zero or more steps than applied
    /// - `Database` for connection or migration failures
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        if self.config.database.backend != StorageBackend::Postgres {
            return Err(AppError::Configuration {
                key: "database.backend".to_string(),
                source: anyhow::anyhow!("Migrations require the postgres storage backend"),
            });
        }
        self.config.database.validate()?;

        match (dry_run, rollback) {
            (true, _) => self.show_pending_migrations().await,
            (false, Some(steps)) => self.rollback_migrations(steps).await,
            (false, None) => self.run_migrations().await,
        }
    }

    async fn show_pending_migrations(&self) -> AppResult<()> {
        let pending = self
            .with_connection("check pending migrations", |conn| {
                conn.pending_migrations(MIGRATIONS)
                    .map(|pending| pending.iter().map(|m| m.name().to_string()).collect::<Vec<_>>())
                    .map_err(|e| anyhow::anyhow!(e))
            })
            .await?;

        if pending.is_empty() {
            println!("✓ No pending migrations - database is up to date");
        } else {
            println!("Found {} pending migration(s):", pending.len());
            for name in &pending {
                println!("  - {name}");
            }
        }
        Ok(())
    }

    async fn run_migrations(&self) -> AppResult<()> {
        let applied = run_pending_migrations(&self.config.database.url).await?;

        if applied.is_empty() {
            println!("✓ No migrations to apply - database is up to date");
        } else {
            println!("✓ Applied {} migration(s):", applied.len());
            for version in &applied {
                println!("  - {version}");
            }
        }
        Ok(())
    }

    async fn rollback_migrations(&self, steps: u32) -> AppResult<()> {
        if steps == 0 {
            return Err(AppError::validation(
                "rollback_steps",
                "Number of rollback steps must be greater than 0",
            ));
        }

        let applied = self
            .with_connection("list applied migrations", |conn| {
                conn.applied_migrations()
                    .map(|versions| versions.len())
                    .map_err(|e| anyhow::anyhow!(e))
            })
            .await?;
        if applied < steps as usize {
            return Err(AppError::validation(
                "rollback_steps",
                format!("Cannot roll back {steps} migration(s); only {applied} applied"),
            ));
        }

        self.with_connection("revert migrations", move |conn| {
            for _ in 0..steps {
                conn.revert_last_migration(MIGRATIONS)
                    .map_err(|e| anyhow::anyhow!(e))?;
            }
            Ok(())
        })
        .await?;

        println!("✓ Rolled back {steps} migration(s)");
        Ok(())
    }

    /// Runs `f` on a blocking synchronous connection; the migration harness
    /// is not async.
    async fn with_connection<T, F>(&self, operation: &'static str, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> anyhow::Result<T> + Send + 'static,
    {
        let url = self.config.database.url.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = PgConnection::establish(&url).map_err(|e| AppError::Database {
                operation: format!("connect to {operation}"),
                source: anyhow::Error::from(e),
            })?;
            f(&mut conn).map_err(|source| AppError::Database {
                operation: operation.to_string(),
                source,
            })
        })
        .await
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Settings {
        let mut config = Settings::default();
        config.database.url = "postgres://localhost/mortgage".to_string();
        config
    }

    #[tokio::test]
    async fn test_zero_rollback_steps_rejected_before_connecting() {
        let handler = MigrateCommandHandler::new(valid_config());
        assert_eq!(handler.config().database.backend, StorageBackend::Postgres);

        let result = handler.execute(false, Some(0)).await;
        assert!(matches!(
            result,
            Err(AppError::Validation { field, .. }) if field == "rollback_steps"
        ));
    }

    #[tokio::test]
    async fn test_memory_backend_rejected() {
        let mut config = valid_config();
        config.database.backend = StorageBackend::Memory;

        let result = MigrateCommandHandler::new(config).execute(true, None).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }
}
