//! Server module for managing HTTP server lifecycle
//!
//! This module handles storage initialization, startup, and graceful shutdown.

use std::path::Path;

use tokio::net::TcpListener;
use tokio::signal;

use crate::api::routes::create_router;
use crate::config::{Environment, StorageBackend, settings::Settings};
use crate::db::{establish_async_connection_pool, run_pending_migrations};
use crate::repositories::{ReferenceData, Repositories};
use crate::state::AppState;

/// Reference data picked up by the memory backend when none is configured.
const DEFAULT_REFERENCE_DATA: &str = "config/reference-data.toml";

/// HTTP server manager
pub struct Server {
    settings: Settings,
}

impl Server {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Start the server and run until a shutdown signal arrives.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Storage initialization (pool, migrations, reference data) errors
    /// - Address binding and server runtime errors
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            app_name = %self.settings.application.name,
            app_version = %self.settings.application.version,
            environment = %Environment::from_env(),
            "Application starting"
        );

        tracing::info!(
            host = %self.settings.server.host,
            port = self.settings.server.port,
            backend = self.settings.database.backend.as_str(),
            log_level = %self.settings.logger.level,
            "Configuration loaded"
        );

        tracing::info!(
            access_token_expiration = self.settings.jwt.access_token_expiration,
            secret_configured = !self.settings.jwt.secret.is_empty(),
            "JWT configuration loaded"
        );

        self.settings.validate().map_err(|e| {
            tracing::error!(error = %e, "Configuration validation failed");
            anyhow::anyhow!("Configuration validation failed: {e}")
        })?;

        let repositories = self.build_repositories().await?;
        let state = AppState::new(
            repositories,
            self.settings.database.backend,
            self.settings.jwt.clone(),
            &self.settings.mortgage,
        );

        let router = create_router(state);

        let address = self.settings.server.address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!(error = %e, address = %address, "Failed to bind to address");
            anyhow::anyhow!("Failed to bind to {address}: {e}")
        })?;

        tracing::info!(address = %address, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    async fn build_repositories(&self) -> anyhow::Result<Repositories> {
        let database = &self.settings.database;

        match database.backend {
            StorageBackend::Postgres => {
                if database.auto_migrate {
                    let applied = run_pending_migrations(&database.url).await?;
                    tracing::info!(count = applied.len(), versions = ?applied, "Migrations applied");
                }

                tracing::info!(
                    max_connections = database.max_connections,
                    min_connections = database.min_connections,
                    connection_timeout = database.connection_timeout,
                    "Initializing database connection pool"
                );
                let pool = establish_async_connection_pool(database).await?;
                Ok(Repositories::postgres(pool))
            }
            StorageBackend::Memory => {
                let data = self.load_reference_data()?;
                tracing::info!(
                    banks = data.banks.len(),
                    rates = data.rates.len(),
                    "Using in-memory storage"
                );
                Ok(Repositories::in_memory(data))
            }
        }
    }

    fn load_reference_data(&self) -> anyhow::Result<ReferenceData> {
        match &self.settings.mortgage.reference_data {
            Some(path) => Ok(ReferenceData::load(path)?),
            None if Path::new(DEFAULT_REFERENCE_DATA).exists() => {
                Ok(ReferenceData::load(DEFAULT_REFERENCE_DATA)?)
            }
            None => {
                tracing::warn!("No reference data configured; rate endpoints will be empty");
                Ok(ReferenceData::default())
            }
        }
    }
}

/// Resolves on Ctrl+C or SIGTERM.
///
/// A signal handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
