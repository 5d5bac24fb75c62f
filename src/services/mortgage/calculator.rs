//! Amortized loan arithmetic.
//!
//! Everything here is a pure function of its arguments. Values keep full
//! `f64` precision; rounding is left to the presentation layer.

use serde::Serialize;

use crate::error::{AppError, AppResult};

/// One period of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentScheduleEntry {
    /// 1-based period number
    pub period: u32,
    pub payment: f64,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub remaining_balance: f64,
}

/// Payment totals for a loan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
}

/// Monthly rate as a fraction, e.g. `2.5` → `0.002083…`.
pub fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / 100.0 / 12.0
}

fn check_arguments(principal: f64, annual_rate_percent: f64, periods: u32) -> AppResult<()> {
    if !(principal.is_finite() && principal > 0.0) {
        return Err(AppError::validation(
            "principal",
            "Principal must be a positive number",
        ));
    }
    if periods < 1 {
        return Err(AppError::validation(
            "periods",
            "Loan must run for at least one period",
        ));
    }
    if !(annual_rate_percent.is_finite() && annual_rate_percent >= 0.0) {
        return Err(AppError::validation(
            "interest_rate",
            "Interest rate cannot be negative",
        ));
    }
    Ok(())
}

/// Fixed monthly payment that retires `principal` over `periods` months.
pub fn compute_monthly_payment(
    principal: f64,
    annual_rate_percent: f64,
    periods: u32,
) -> AppResult<f64> {
    check_arguments(principal, annual_rate_percent, periods)?;

    if annual_rate_percent == 0.0 {
        return Ok(principal / f64::from(periods));
    }

    // r(1+r)^n / ((1+r)^n - 1) rewritten as r + r / ((1+r)^n - 1), with the
    // growth term from ln_1p/exp_m1 so tiny rates keep their precision.
    let r = monthly_rate(annual_rate_percent);
    let growth_m1 = (f64::from(periods) * r.ln_1p()).exp_m1();
    Ok(principal * (r + r / growth_m1))
}

/// Monthly payment with its totals.
pub fn summarize(principal: f64, annual_rate_percent: f64, periods: u32) -> AppResult<PaymentSummary> {
    let monthly_payment = compute_monthly_payment(principal, annual_rate_percent, periods)?;
    let total_payment = monthly_payment * f64::from(periods);

    Ok(PaymentSummary {
        monthly_payment,
        total_payment,
        total_interest: total_payment - principal,
    })
}

/// Period-by-period breakdown of `payment`.
///
/// The last period pays off whatever balance is left, so principal portions
/// add up to `principal` and the final `remaining_balance` is exactly zero.
pub fn generate_schedule(
    principal: f64,
    annual_rate_percent: f64,
    periods: u32,
    payment: f64,
) -> AppResult<Vec<PaymentScheduleEntry>> {
    check_arguments(principal, annual_rate_percent, periods)?;
    if !(payment.is_finite() && payment > 0.0) {
        return Err(AppError::validation("payment", "Payment must be a positive number"));
    }

    let r = monthly_rate(annual_rate_percent);
    let mut balance = principal;
    let mut schedule = Vec::with_capacity(periods as usize);

    for period in 1..=periods {
        let interest_portion = balance * r;

        let entry = if period == periods {
            PaymentScheduleEntry {
                period,
                payment: balance + interest_portion,
                principal_portion: balance,
                interest_portion,
                remaining_balance: 0.0,
            }
        } else {
            let principal_portion = payment - interest_portion;
            balance -= principal_portion;
            PaymentScheduleEntry {
                period,
                payment,
                principal_portion,
                interest_portion,
                remaining_balance: balance,
            }
        };
        schedule.push(entry);
    }

    Ok(schedule)
}
