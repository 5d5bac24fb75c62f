//! Mortgage calculation and application engine.

pub mod application_no;
pub mod calculator;
pub mod comparison;
pub mod lifecycle;
mod service;

pub use application_no::{ApplicationNumberGenerator, RandomSuffixGenerator};
pub use calculator::{PaymentScheduleEntry, PaymentSummary};
pub use comparison::{
    MAX_AMOUNT, MAX_INTEREST_RATE, MAX_LOAN_PERIOD, MIN_LOAN_PERIOD, RATE_DECIMAL_PLACES,
    RateComparisonEngine, RateComparisonEntry, within_rate_precision,
};
pub use lifecycle::{ApplicationLifecycleManager, ApplicationQuery, CreateApplicationCommand};
pub use service::{CalculateCommand, MortgageQuote, MortgageService};
