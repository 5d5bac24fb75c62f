//! Mortgage service orchestrating calculation, rate comparison and the
//! application lifecycle.
//!
//! This is the only mortgage type the HTTP layer talks to. Domain errors are
//! returned unchanged; infrastructure failures are logged here with the
//! operation and identifiers before being surfaced.

use std::sync::Arc;

use super::application_no::{ApplicationNumberGenerator, RandomSuffixGenerator};
use super::calculator::{self, PaymentScheduleEntry, PaymentSummary};
use super::comparison::{
    MAX_LOAN_PERIOD, MIN_LOAN_PERIOD, RateComparisonEngine, RateComparisonEntry, check_amount,
    check_interest_rate,
};
use super::lifecycle::{ApplicationLifecycleManager, ApplicationQuery, CreateApplicationCommand};
use crate::config::MortgageConfig;
use crate::error::{AppError, AppResult};
use crate::models::{ApplicationStatus, MortgageApplication, RateListing, RateType};
use crate::repositories::Repositories;

/// Inputs of a what-if calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculateCommand {
    pub property_price: f64,
    pub down_payment: f64,
    pub loan_period: u32,
    pub interest_rate: f64,
}

/// Result of a what-if calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct MortgageQuote {
    pub loan_amount: f64,
    pub ltv: f64,
    pub summary: PaymentSummary,
    /// Leading periods of the schedule followed by the final period.
    pub schedule_preview: Vec<PaymentScheduleEntry>,
}

#[derive(Clone)]
pub struct MortgageService {
    comparison: RateComparisonEngine,
    lifecycle: ApplicationLifecycleManager,
    preview_periods: usize,
}

impl MortgageService {
    /// Wires the service over the given stores with random-suffix
    /// application numbers.
    pub fn new(repos: Repositories, config: &MortgageConfig) -> Self {
        let numbers: Arc<dyn ApplicationNumberGenerator> =
            Arc::new(RandomSuffixGenerator::new(config.application_no_prefix.clone()));
        Self::with_generator(repos, config, numbers)
    }

    pub fn with_generator(
        repos: Repositories,
        config: &MortgageConfig,
        numbers: Arc<dyn ApplicationNumberGenerator>,
    ) -> Self {
        Self {
            comparison: RateComparisonEngine::new(repos.rates.clone()),
            lifecycle: ApplicationLifecycleManager::new(
                repos.rates,
                repos.applications,
                numbers,
                config.application_no_max_attempts,
            ),
            preview_periods: config.schedule_preview_periods,
        }
    }

    /// Prices a loan of `property_price - down_payment`.
    pub fn calculate(&self, command: CalculateCommand) -> AppResult<MortgageQuote> {
        let CalculateCommand {
            property_price,
            down_payment,
            loan_period,
            interest_rate,
        } = command;

        check_amount("property_price", "Property price", property_price)?;
        if !(down_payment.is_finite() && down_payment >= 0.0) {
            return Err(AppError::validation(
                "down_payment",
                "Down payment cannot be negative",
            ));
        }
        if down_payment >= property_price {
            return Err(AppError::validation(
                "down_payment",
                "Down payment must be less than the property price",
            ));
        }
        if !(MIN_LOAN_PERIOD..=MAX_LOAN_PERIOD).contains(&loan_period) {
            return Err(AppError::validation(
                "loan_period",
                format!("Loan period must be between {MIN_LOAN_PERIOD} and {MAX_LOAN_PERIOD} months"),
            ));
        }
        check_interest_rate(interest_rate)?;

        let loan_amount = property_price - down_payment;
        let summary = calculator::summarize(loan_amount, interest_rate, loan_period)?;
        let schedule =
            calculator::generate_schedule(loan_amount, interest_rate, loan_period, summary.monthly_payment)?;

        Ok(MortgageQuote {
            loan_amount,
            ltv: loan_amount / property_price,
            summary,
            schedule_preview: preview(schedule, self.preview_periods),
        })
    }

    pub async fn list_rates(&self, rate_type: Option<RateType>) -> AppResult<Vec<RateListing>> {
        self.comparison
            .list_effective_rates(rate_type)
            .await
            .inspect_err(|e| log_failure("list_rates", e))
    }

    pub async fn bank_rates(&self, bank_id: i32) -> AppResult<Vec<RateListing>> {
        self.comparison
            .get_rates_for_bank(bank_id)
            .await
            .inspect_err(|e| {
                if is_internal(e) {
                    tracing::error!(error = ?e, bank_id, "bank_rates failed");
                }
            })
    }

    pub async fn compare_rates(
        &self,
        loan_amount: f64,
        loan_period: u32,
        rate_type: Option<RateType>,
    ) -> AppResult<Vec<RateComparisonEntry>> {
        self.comparison
            .compare_rates(loan_amount, loan_period, rate_type)
            .await
            .inspect_err(|e| log_failure("compare_rates", e))
    }

    /// Submits an application on behalf of `user_id`.
    pub async fn apply(
        &self,
        user_id: i32,
        command: CreateApplicationCommand,
    ) -> AppResult<MortgageApplication> {
        if command.loan_amount > command.property_price {
            return Err(AppError::validation(
                "loan_amount",
                "Loan amount cannot exceed the property price",
            ));
        }

        let bank_id = command.bank_id;
        self.lifecycle
            .create_application(user_id, command)
            .await
            .inspect_err(|e| {
                if is_internal(e) {
                    tracing::error!(error = ?e, user_id, bank_id, "apply failed");
                }
            })
    }

    pub async fn get_application(&self, user_id: i32, id: i64) -> AppResult<MortgageApplication> {
        self.lifecycle
            .get_application(user_id, id)
            .await
            .inspect_err(|e| {
                if is_internal(e) {
                    tracing::error!(error = ?e, user_id, application_id = id, "get_application failed");
                }
            })
    }

    pub async fn list_applications(
        &self,
        user_id: i32,
        query: &ApplicationQuery,
    ) -> AppResult<(Vec<MortgageApplication>, i64)> {
        self.lifecycle
            .list_applications(user_id, query)
            .await
            .inspect_err(|e| {
                if is_internal(e) {
                    tracing::error!(error = ?e, user_id, "list_applications failed");
                }
            })
    }

    /// Withdraws a pending or under-review application owned by `user_id`.
    pub async fn withdraw_application(&self, user_id: i32, id: i64) -> AppResult<MortgageApplication> {
        self.lifecycle
            .transition_status(user_id, id, ApplicationStatus::Withdrawn)
            .await
            .inspect_err(|e| {
                if is_internal(e) {
                    tracing::error!(error = ?e, user_id, application_id = id, "withdraw_application failed");
                }
            })
    }
}

/// First `leading` entries plus the final one.
fn preview(mut schedule: Vec<PaymentScheduleEntry>, leading: usize) -> Vec<PaymentScheduleEntry> {
    if schedule.len() <= leading + 1 {
        return schedule;
    }
    let last = schedule[schedule.len() - 1];
    schedule.truncate(leading);
    schedule.push(last);
    schedule
}

fn is_internal(error: &AppError) -> bool {
    matches!(
        error,
        AppError::Database { .. }
            | AppError::ConnectionPool { .. }
            | AppError::Configuration { .. }
            | AppError::Internal { .. }
    )
}

fn log_failure(operation: &str, error: &AppError) {
    if is_internal(error) {
        tracing::error!(error = ?error, operation, "Mortgage operation failed");
    }
}
