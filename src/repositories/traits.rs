//! Storage collaborators used by the mortgage services.

use async_trait::async_trait;
use jiff::Timestamp;

use crate::error::AppResult;
use crate::models::{
    ApplicationFilter, ApplicationStatus, Bank, MortgageApplication, NewMortgageApplication,
    RateListing,
};

/// Read-only access to banks and their published rates.
#[async_trait]
pub trait RateStore: Send + Sync {
    async fn find_bank(&self, bank_id: i32) -> AppResult<Option<Bank>>;

    /// Rates effective at `at` that belong to active banks, ordered by rate id.
    async fn effective_rates(&self, at: Timestamp) -> AppResult<Vec<RateListing>>;

    /// Every rate of one bank regardless of validity, ordered by rate id.
    async fn rates_by_bank(&self, bank_id: i32) -> AppResult<Vec<RateListing>>;

    /// Cheap round trip used by the health endpoint.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Persistence for mortgage applications.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Inserts a new application.
    ///
    /// Fails with `AppError::Duplicate` on field `application_no` when the
    /// number is already taken.
    async fn create(&self, application: NewMortgageApplication) -> AppResult<MortgageApplication>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<MortgageApplication>>;

    /// One page of a user's applications plus the total matching count.
    async fn list_by_user(
        &self,
        user_id: i32,
        filter: &ApplicationFilter,
    ) -> AppResult<(Vec<MortgageApplication>, i64)>;

    /// Sets `next` only if the stored status still equals `expected`.
    ///
    /// Returns `None` when the row is missing or its status has moved on.
    /// `reviewed_at` is set when `next` is a review outcome.
    async fn update_status(
        &self,
        id: i64,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        at: Timestamp,
    ) -> AppResult<Option<MortgageApplication>>;
}
