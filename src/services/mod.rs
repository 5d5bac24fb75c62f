//! Service layer for business logic operations.
//!
//! Services encapsulate business logic and coordinate between
//! repositories and handlers.

pub mod mortgage;

pub use mortgage::MortgageService;

use crate::config::MortgageConfig;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// Held in Axum application state. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct Services {
    pub mortgage: MortgageService,
}

impl Services {
    pub fn new(repos: Repositories, mortgage: &MortgageConfig) -> Self {
        Self {
            mortgage: MortgageService::new(repos, mortgage),
        }
    }
}
