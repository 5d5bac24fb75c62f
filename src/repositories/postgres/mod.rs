//! Diesel-backed stores.

mod application_repo;
mod rate_repo;
mod records;

pub use application_repo::PgApplicationRepository;
pub use rate_repo::PgRateRepository;
