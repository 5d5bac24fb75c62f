//! Ranking of published bank rates.

use std::sync::Arc;

use jiff::Timestamp;
use serde::Serialize;

use super::calculator;
use crate::error::{AppError, AppResult};
use crate::models::{Bank, RateListing, RateType};
use crate::repositories::RateStore;

/// Shortest and longest loan terms offered, in months.
pub const MIN_LOAN_PERIOD: u32 = 12;
pub const MAX_LOAN_PERIOD: u32 = 360;

/// Ceiling for property prices, loan amounts and incomes. A 360-month loan at
/// the 20% rate ceiling still totals under the 10^12 stored money limit.
pub const MAX_AMOUNT: f64 = 100_000_000_000.0;

/// Highest annual interest rate accepted, in percent.
pub const MAX_INTEREST_RATE: f64 = 20.0;

/// Decimal places an annual interest rate may carry.
pub const RATE_DECIMAL_PLACES: i32 = 6;

/// Whether `rate` has no digits beyond [`RATE_DECIMAL_PLACES`].
pub fn within_rate_precision(rate: f64) -> bool {
    let scaled = rate * 10f64.powi(RATE_DECIMAL_PLACES);
    (scaled - scaled.round()).abs() < 1e-6
}

/// Rejects a rate outside (0, [`MAX_INTEREST_RATE`]] or finer than
/// [`RATE_DECIMAL_PLACES`].
pub(crate) fn check_interest_rate(rate: f64) -> AppResult<()> {
    if !(rate.is_finite() && rate > 0.0 && rate <= MAX_INTEREST_RATE) {
        return Err(AppError::validation(
            "interest_rate",
            format!("Interest rate must be greater than 0 and at most {MAX_INTEREST_RATE}"),
        ));
    }
    if !within_rate_precision(rate) {
        return Err(AppError::validation(
            "interest_rate",
            format!("Interest rate may have at most {RATE_DECIMAL_PLACES} decimal places"),
        ));
    }
    Ok(())
}

/// Rejects an amount that is not positive or exceeds [`MAX_AMOUNT`].
pub(crate) fn check_amount(field: &str, label: &str, value: f64) -> AppResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(AppError::validation(field, format!("{label} must be positive")));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::validation(
            field,
            format!("{label} must be at most {MAX_AMOUNT:.0}"),
        ));
    }
    Ok(())
}

/// Cost of one rate offer for a requested loan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateComparisonEntry {
    pub bank: Bank,
    pub rate_id: i32,
    pub rate_type: RateType,
    pub interest_rate: f64,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub processing_fee: Option<f64>,
    /// `total_payment` plus the processing fee, if any.
    pub total_cost: f64,
}

/// Orders `listings` by ascending interest rate; equal rates keep rate-id order.
fn sort_by_rate(mut listings: Vec<RateListing>) -> Vec<RateListing> {
    listings.sort_by_key(|l| l.rate.id);
    listings.sort_by(|a, b| a.rate.interest_rate.total_cmp(&b.rate.interest_rate));
    listings
}

#[derive(Clone)]
pub struct RateComparisonEngine {
    rates: Arc<dyn RateStore>,
}

impl RateComparisonEngine {
    pub fn new(rates: Arc<dyn RateStore>) -> Self {
        Self { rates }
    }

    /// Rates of active banks effective now, cheapest first.
    pub async fn list_effective_rates(&self, rate_type: Option<RateType>) -> AppResult<Vec<RateListing>> {
        self.list_effective_rates_at(rate_type, Timestamp::now()).await
    }

    pub async fn list_effective_rates_at(
        &self,
        rate_type: Option<RateType>,
        at: Timestamp,
    ) -> AppResult<Vec<RateListing>> {
        let listings = self
            .rates
            .effective_rates(at)
            .await?
            .into_iter()
            .filter(|l| rate_type.is_none_or(|t| l.rate.rate_type == t))
            .collect();

        Ok(sort_by_rate(listings))
    }

    /// Prices `loan_amount` over `loan_period` months against every effective
    /// rate, keeping the order of [`Self::list_effective_rates`].
    pub async fn compare_rates(
        &self,
        loan_amount: f64,
        loan_period: u32,
        rate_type: Option<RateType>,
    ) -> AppResult<Vec<RateComparisonEntry>> {
        check_amount("loan_amount", "Loan amount", loan_amount)?;
        if !(MIN_LOAN_PERIOD..=MAX_LOAN_PERIOD).contains(&loan_period) {
            return Err(AppError::validation(
                "loan_period",
                format!("Loan period must be between {MIN_LOAN_PERIOD} and {MAX_LOAN_PERIOD} months"),
            ));
        }

        self.list_effective_rates(rate_type)
            .await?
            .into_iter()
            .map(|listing| -> AppResult<RateComparisonEntry> {
                let summary =
                    calculator::summarize(loan_amount, listing.rate.interest_rate, loan_period)?;
                Ok(RateComparisonEntry {
                    rate_id: listing.rate.id,
                    rate_type: listing.rate.rate_type,
                    interest_rate: listing.rate.interest_rate,
                    monthly_payment: summary.monthly_payment,
                    total_payment: summary.total_payment,
                    total_interest: summary.total_interest,
                    processing_fee: listing.rate.processing_fee,
                    total_cost: summary.total_payment + listing.rate.processing_fee.unwrap_or(0.0),
                    bank: listing.bank,
                })
            })
            .collect()
    }

    /// All rates of one bank, cheapest first.
    pub async fn get_rates_for_bank(&self, bank_id: i32) -> AppResult<Vec<RateListing>> {
        if self.rates.find_bank(bank_id).await?.is_none() {
            return Err(AppError::not_found("bank", "id", bank_id));
        }

        Ok(sort_by_rate(self.rates.rates_by_bank(bank_id).await?))
    }
}
