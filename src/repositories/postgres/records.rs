//! Diesel row types and their conversions to the domain models.
//!
//! Money and rate columns are `NUMERIC`; the engine works in `f64`, so values
//! are rounded to six decimal places on the way in.

use bigdecimal::{BigDecimal, ToPrimitive};
use diesel::prelude::*;
use jiff_diesel::{Timestamp, ToDiesel};

use crate::error::{AppError, AppResult};
use crate::models::{
    ApplicationStatus, Bank, MortgageApplication, MortgageRate, NewMortgageApplication, RateType,
};

const NUMERIC_SCALE: i64 = 6;

pub(super) fn to_numeric(field: &str, value: f64) -> AppResult<BigDecimal> {
    BigDecimal::try_from(value)
        .map(|d| d.round(NUMERIC_SCALE))
        .map_err(|_| AppError::validation(field, format!("{value} is not a finite number")))
}

fn from_numeric(field: &str, value: &BigDecimal) -> AppResult<f64> {
    value.to_f64().ok_or_else(|| AppError::Internal {
        source: anyhow::anyhow!("column {field} holds a value outside f64 range: {value}"),
    })
}

fn from_optional_numeric(field: &str, value: Option<&BigDecimal>) -> AppResult<Option<f64>> {
    value.map(|v| from_numeric(field, v)).transpose()
}

// ============================================================================
// Banks and rates
// ============================================================================

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::banks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct BankRecord {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub name_en: Option<String>,
    pub is_active: bool,
}

impl From<BankRecord> for Bank {
    fn from(record: BankRecord) -> Self {
        Bank {
            id: record.id,
            code: record.code,
            name: record.name,
            name_en: record.name_en,
            is_active: record.is_active,
        }
    }
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::mortgage_rates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct RateRecord {
    pub id: i32,
    pub bank_id: i32,
    pub rate_type: RateType,
    pub interest_rate: BigDecimal,
    pub effective_date: Timestamp,
    pub expiry_date: Option<Timestamp>,
    pub processing_fee: Option<BigDecimal>,
    pub description: Option<String>,
}

impl TryFrom<RateRecord> for MortgageRate {
    type Error = AppError;

    fn try_from(record: RateRecord) -> AppResult<Self> {
        Ok(MortgageRate {
            id: record.id,
            bank_id: record.bank_id,
            rate_type: record.rate_type,
            interest_rate: from_numeric("interest_rate", &record.interest_rate)?,
            effective_date: record.effective_date.to_jiff(),
            expiry_date: record.expiry_date.map(|t| t.to_jiff()),
            processing_fee: from_optional_numeric(
                "processing_fee",
                record.processing_fee.as_ref(),
            )?,
            description: record.description,
        })
    }
}

// ============================================================================
// Applications
// ============================================================================

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::mortgage_applications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(super) struct ApplicationRecord {
    pub id: i64,
    pub application_no: String,
    pub user_id: i32,
    pub bank_id: i32,
    pub property_id: Option<i64>,
    pub property_price: BigDecimal,
    pub down_payment: BigDecimal,
    pub loan_amount: BigDecimal,
    pub interest_rate: BigDecimal,
    pub loan_period: i32,
    pub monthly_payment: BigDecimal,
    pub total_payment: BigDecimal,
    pub total_interest: BigDecimal,
    pub ltv: BigDecimal,
    pub applicant_name: String,
    pub applicant_phone: String,
    pub applicant_email: String,
    pub applicant_income: BigDecimal,
    pub applicant_occupation: Option<String>,
    pub remarks: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TryFrom<ApplicationRecord> for MortgageApplication {
    type Error = AppError;

    fn try_from(r: ApplicationRecord) -> AppResult<Self> {
        Ok(MortgageApplication {
            id: r.id,
            application_no: r.application_no,
            user_id: r.user_id,
            bank_id: r.bank_id,
            property_id: r.property_id,
            property_price: from_numeric("property_price", &r.property_price)?,
            down_payment: from_numeric("down_payment", &r.down_payment)?,
            loan_amount: from_numeric("loan_amount", &r.loan_amount)?,
            interest_rate: from_numeric("interest_rate", &r.interest_rate)?,
            loan_period: r.loan_period,
            monthly_payment: from_numeric("monthly_payment", &r.monthly_payment)?,
            total_payment: from_numeric("total_payment", &r.total_payment)?,
            total_interest: from_numeric("total_interest", &r.total_interest)?,
            ltv: from_numeric("ltv", &r.ltv)?,
            applicant_name: r.applicant_name,
            applicant_phone: r.applicant_phone,
            applicant_email: r.applicant_email,
            applicant_income: from_numeric("applicant_income", &r.applicant_income)?,
            applicant_occupation: r.applicant_occupation,
            remarks: r.remarks,
            status: r.status,
            submitted_at: r.submitted_at.to_jiff(),
            reviewed_at: r.reviewed_at.map(|t| t.to_jiff()),
            created_at: r.created_at.to_jiff(),
            updated_at: r.updated_at.to_jiff(),
        })
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::mortgage_applications)]
pub(super) struct NewApplicationRecord {
    pub application_no: String,
    pub user_id: i32,
    pub bank_id: i32,
    pub property_id: Option<i64>,
    pub property_price: BigDecimal,
    pub down_payment: BigDecimal,
    pub loan_amount: BigDecimal,
    pub interest_rate: BigDecimal,
    pub loan_period: i32,
    pub monthly_payment: BigDecimal,
    pub total_payment: BigDecimal,
    pub total_interest: BigDecimal,
    pub ltv: BigDecimal,
    pub applicant_name: String,
    pub applicant_phone: String,
    pub applicant_email: String,
    pub applicant_income: BigDecimal,
    pub applicant_occupation: Option<String>,
    pub remarks: Option<String>,
    pub status: ApplicationStatus,
    pub submitted_at: Timestamp,
}

impl TryFrom<NewMortgageApplication> for NewApplicationRecord {
    type Error = AppError;

    fn try_from(n: NewMortgageApplication) -> AppResult<Self> {
        Ok(NewApplicationRecord {
            application_no: n.application_no,
            user_id: n.user_id,
            bank_id: n.bank_id,
            property_id: n.property_id,
            property_price: to_numeric("property_price", n.property_price)?,
            down_payment: to_numeric("down_payment", n.down_payment)?,
            loan_amount: to_numeric("loan_amount", n.loan_amount)?,
            interest_rate: to_numeric("interest_rate", n.interest_rate)?,
            loan_period: n.loan_period,
            monthly_payment: to_numeric("monthly_payment", n.monthly_payment)?,
            total_payment: to_numeric("total_payment", n.total_payment)?,
            total_interest: to_numeric("total_interest", n.total_interest)?,
            ltv: to_numeric("ltv", n.ltv)?,
            applicant_name: n.applicant_name,
            applicant_phone: n.applicant_phone,
            applicant_email: n.applicant_email,
            applicant_income: to_numeric("applicant_income", n.applicant_income)?,
            applicant_occupation: n.applicant_occupation,
            remarks: n.remarks,
            status: n.status,
            submitted_at: n.submitted_at.to_diesel(),
        })
    }
}
