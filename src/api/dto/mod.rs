//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `mortgage` - calculator, rate and application DTOs
//! - `health` - health check DTOs
//! - `error` - Common error response DTOs
//! - `pagination` - Pagination-related DTOs

mod error;
mod health;
mod mortgage;
mod pagination;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use mortgage::{
    ApplicationListQuery, ApplicationResponse, ApplyRequest, BankResponse, CalculateRequest,
    CalculateResponse, CompareRatesRequest, PaymentScheduleEntryResponse, RateComparisonResponse,
    RateQuery, RateResponse, round_currency, round_ratio,
};
pub use pagination::{PagedResponse, PaginationMeta};
