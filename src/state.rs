//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use crate::config::{JwtConfig, MortgageConfig, StorageBackend};
use crate::repositories::Repositories;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap since services and stores sit behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Direct access to the stores, used by health checks
    pub repositories: Repositories,
    /// Which backend the stores run on
    pub storage_backend: StorageBackend,
    /// JWT configuration for token validation
    pub jwt_config: JwtConfig,
}

impl AppState {
    /// Creates the state over already-built stores.
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool(&settings.database).await?;
    /// let state = AppState::new(
    ///     Repositories::postgres(pool),
    ///     StorageBackend::Postgres,
    ///     settings.jwt.clone(),
    ///     &settings.mortgage,
    /// );
    /// ```
    pub fn new(
        repositories: Repositories,
        storage_backend: StorageBackend,
        jwt_config: JwtConfig,
        mortgage: &MortgageConfig,
    ) -> Self {
        let services = Services::new(repositories.clone(), mortgage);
        Self {
            services,
            repositories,
            storage_backend,
            jwt_config,
        }
    }
}
