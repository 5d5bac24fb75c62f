//! Repository layer for data access operations.
//!
//! The mortgage services depend on the `RateStore` and `ApplicationStore`
//! traits; PostgreSQL and in-memory implementations are provided.

pub mod memory;
mod postgres;
mod traits;

pub use memory::{InMemoryApplicationStore, InMemoryRateStore, ReferenceData};
pub use postgres::{PgApplicationRepository, PgRateRepository};
pub use traits::{ApplicationStore, RateStore};

use std::sync::Arc;

use crate::db::AsyncDbPool;

/// Aggregates the stores for convenient access.
///
/// Cloning only bumps reference counts.
#[derive(Clone)]
pub struct Repositories {
    pub rates: Arc<dyn RateStore>,
    pub applications: Arc<dyn ApplicationStore>,
}

impl Repositories {
    /// Stores backed by the given PostgreSQL pool.
    pub fn postgres(pool: AsyncDbPool) -> Self {
        Self {
            rates: Arc::new(PgRateRepository::new(pool.clone())),
            applications: Arc::new(PgApplicationRepository::new(pool)),
        }
    }

    /// Process-local stores seeded with the given reference data.
    pub fn in_memory(data: ReferenceData) -> Self {
        Self {
            rates: Arc::new(InMemoryRateStore::new(data)),
            applications: Arc::new(InMemoryApplicationStore::new()),
        }
    }
}
