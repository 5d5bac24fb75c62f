//! Mortgage DTOs for API requests and responses.
//!
//! Responses are the presentation boundary: currency is rounded to cents and
//! ratios to four decimals here, never earlier.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::pagination::{default_page, default_page_size};
use crate::models::{
    ApplicationSortField, ApplicationStatus, Bank, MortgageApplication, RateListing, RateType,
    SortOrder,
};
use crate::services::mortgage::{
    ApplicationQuery, CalculateCommand, CreateApplicationCommand, MortgageQuote,
    PaymentScheduleEntry, RateComparisonEntry,
};

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Rounds a money amount to cents.
pub fn round_currency(value: f64) -> f64 {
    round_to(value, 2)
}

/// Rounds a ratio such as LTV to four decimals.
pub fn round_ratio(value: f64) -> f64 {
    round_to(value, 4)
}

// ============================================================================
// Calculator
// ============================================================================

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "property_price": 5000000,
    "down_payment": 1000000,
    "loan_period": 300,
    "interest_rate": 2.5
}))]
pub struct CalculateRequest {
    #[validate(range(exclusive_min = 0.0, max = 100_000_000_000.0, message = "Property price must be positive and at most 100000000000"))]
    pub property_price: f64,

    #[validate(range(min = 0.0, message = "Down payment cannot be negative"))]
    pub down_payment: f64,

    /// Loan term in months
    #[validate(range(min = 12, max = 360, message = "Loan period must be between 12 and 360 months"))]
    pub loan_period: u32,

    /// Annual interest rate in percent
    #[validate(range(exclusive_min = 0.0, max = 20.0, message = "Interest rate must be greater than 0 and at most 20"))]
    pub interest_rate: f64,
}

impl From<CalculateRequest> for CalculateCommand {
    fn from(req: CalculateRequest) -> Self {
        CalculateCommand {
            property_price: req.property_price,
            down_payment: req.down_payment,
            loan_period: req.loan_period,
            interest_rate: req.interest_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentScheduleEntryResponse {
    pub period: u32,
    pub payment: f64,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub remaining_balance: f64,
}

impl From<PaymentScheduleEntry> for PaymentScheduleEntryResponse {
    fn from(entry: PaymentScheduleEntry) -> Self {
        Self {
            period: entry.period,
            payment: round_currency(entry.payment),
            principal_portion: round_currency(entry.principal_portion),
            interest_portion: round_currency(entry.interest_portion),
            remaining_balance: round_currency(entry.remaining_balance),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CalculateResponse {
    pub loan_amount: f64,
    /// Loan-to-value ratio
    pub ltv: f64,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    /// Leading periods followed by the final period
    pub payment_schedule: Vec<PaymentScheduleEntryResponse>,
}

impl From<MortgageQuote> for CalculateResponse {
    fn from(quote: MortgageQuote) -> Self {
        Self {
            loan_amount: round_currency(quote.loan_amount),
            ltv: round_ratio(quote.ltv),
            monthly_payment: round_currency(quote.summary.monthly_payment),
            total_payment: round_currency(quote.summary.total_payment),
            total_interest: round_currency(quote.summary.total_interest),
            payment_schedule: quote
                .schedule_preview
                .into_iter()
                .map(PaymentScheduleEntryResponse::from)
                .collect(),
        }
    }
}

// ============================================================================
// Banks and rates
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BankResponse {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub name_en: Option<String>,
}

impl From<Bank> for BankResponse {
    fn from(bank: Bank) -> Self {
        Self {
            id: bank.id,
            code: bank.code,
            name: bank.name,
            name_en: bank.name_en,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct RateQuery {
    /// Only rates of this type
    pub rate_type: Option<RateType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RateResponse {
    pub id: i32,
    pub bank: BankResponse,
    pub rate_type: RateType,
    /// Annual interest rate in percent
    pub interest_rate: f64,
    #[schema(value_type = String, format = DateTime)]
    pub effective_date: Timestamp,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub expiry_date: Option<Timestamp>,
    pub processing_fee: Option<f64>,
    pub description: Option<String>,
}

impl From<RateListing> for RateResponse {
    fn from(listing: RateListing) -> Self {
        let RateListing { rate, bank } = listing;
        Self {
            id: rate.id,
            bank: BankResponse::from(bank),
            rate_type: rate.rate_type,
            interest_rate: rate.interest_rate,
            effective_date: rate.effective_date,
            expiry_date: rate.expiry_date,
            processing_fee: rate.processing_fee.map(round_currency),
            description: rate.description,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "loan_amount": 2000000,
    "loan_period": 240,
    "rate_type": "fixed"
}))]
pub struct CompareRatesRequest {
    #[validate(range(exclusive_min = 0.0, max = 100_000_000_000.0, message = "Loan amount must be positive and at most 100000000000"))]
    pub loan_amount: f64,

    #[validate(range(min = 12, max = 360, message = "Loan period must be between 12 and 360 months"))]
    pub loan_period: u32,

    #[serde(default)]
    pub rate_type: Option<RateType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RateComparisonResponse {
    pub bank: BankResponse,
    pub rate_id: i32,
    pub rate_type: RateType,
    pub interest_rate: f64,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub processing_fee: Option<f64>,
    /// Total payment plus processing fee
    pub total_cost: f64,
}

impl From<RateComparisonEntry> for RateComparisonResponse {
    fn from(entry: RateComparisonEntry) -> Self {
        Self {
            bank: BankResponse::from(entry.bank),
            rate_id: entry.rate_id,
            rate_type: entry.rate_type,
            interest_rate: entry.interest_rate,
            monthly_payment: round_currency(entry.monthly_payment),
            total_payment: round_currency(entry.total_payment),
            total_interest: round_currency(entry.total_interest),
            processing_fee: entry.processing_fee.map(round_currency),
            total_cost: round_currency(entry.total_cost),
        }
    }
}

// ============================================================================
// Applications
// ============================================================================

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "bank_id": 1,
    "property_id": 88,
    "property_price": 5000000,
    "loan_amount": 4000000,
    "loan_period": 300,
    "interest_rate": 2.5,
    "applicant_name": "Chan Tai Man",
    "applicant_phone": "+852 5555 0000",
    "applicant_email": "chan@example.com",
    "applicant_income": 120000,
    "applicant_occupation": "Engineer"
}))]
pub struct ApplyRequest {
    pub bank_id: i32,

    #[serde(default)]
    pub property_id: Option<i64>,

    #[validate(range(exclusive_min = 0.0, max = 100_000_000_000.0, message = "Property price must be positive and at most 100000000000"))]
    pub property_price: f64,

    #[validate(range(exclusive_min = 0.0, max = 100_000_000_000.0, message = "Loan amount must be positive and at most 100000000000"))]
    pub loan_amount: f64,

    #[validate(range(min = 12, max = 360, message = "Loan period must be between 12 and 360 months"))]
    pub loan_period: u32,

    #[validate(range(exclusive_min = 0.0, max = 20.0, message = "Interest rate must be greater than 0 and at most 20"))]
    pub interest_rate: f64,

    #[validate(length(min = 1, max = 100, message = "Applicant name must be 1-100 characters"))]
    pub applicant_name: String,

    #[validate(length(min = 1, max = 30, message = "Applicant phone must be 1-30 characters"))]
    pub applicant_phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub applicant_email: String,

    #[validate(range(min = 0.0, max = 100_000_000_000.0, message = "Applicant income must be between 0 and 100000000000"))]
    pub applicant_income: f64,

    #[serde(default)]
    #[validate(length(max = 100, message = "Occupation must be at most 100 characters"))]
    pub applicant_occupation: Option<String>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Remarks must be at most 1000 characters"))]
    pub remarks: Option<String>,
}

impl From<ApplyRequest> for CreateApplicationCommand {
    fn from(req: ApplyRequest) -> Self {
        CreateApplicationCommand {
            bank_id: req.bank_id,
            property_id: req.property_id,
            property_price: req.property_price,
            loan_amount: req.loan_amount,
            interest_rate: req.interest_rate,
            loan_period: req.loan_period,
            applicant_name: req.applicant_name,
            applicant_phone: req.applicant_phone,
            applicant_email: req.applicant_email,
            applicant_income: req.applicant_income,
            applicant_occupation: req.applicant_occupation,
            remarks: req.remarks,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ApplicationListQuery {
    pub status: Option<ApplicationStatus>,

    pub bank_id: Option<i32>,

    #[serde(default)]
    pub sort_by: ApplicationSortField,

    #[serde(default)]
    pub sort_order: SortOrder,

    /// Page number (1-based)
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    #[param(minimum = 1, example = 1)]
    pub page: u32,

    /// Number of items per page (max 100)
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "Page size must be between 1 and 100"))]
    #[param(minimum = 1, maximum = 100, example = 20)]
    pub page_size: u32,
}

impl From<&ApplicationListQuery> for ApplicationQuery {
    fn from(query: &ApplicationListQuery) -> Self {
        ApplicationQuery {
            status: query.status,
            bank_id: query.bank_id,
            sort_by: query.sort_by,
            sort_order: query.sort_order,
            page: query.page,
            page_size: query.page_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: i64,
    #[schema(example = "MA20260101042137")]
    pub application_no: String,
    pub user_id: i32,
    pub bank_id: i32,
    pub property_id: Option<i64>,
    pub property_price: f64,
    pub down_payment: f64,
    pub loan_amount: f64,
    pub interest_rate: f64,
    pub loan_period: i32,
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub ltv: f64,
    pub applicant_name: String,
    pub applicant_phone: String,
    pub applicant_email: String,
    pub applicant_income: f64,
    pub applicant_occupation: Option<String>,
    pub remarks: Option<String>,
    pub status: ApplicationStatus,
    #[schema(value_type = String, format = DateTime)]
    pub submitted_at: Timestamp,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub reviewed_at: Option<Timestamp>,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: Timestamp,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: Timestamp,
}

impl From<MortgageApplication> for ApplicationResponse {
    fn from(app: MortgageApplication) -> Self {
        Self {
            id: app.id,
            application_no: app.application_no,
            user_id: app.user_id,
            bank_id: app.bank_id,
            property_id: app.property_id,
            property_price: round_currency(app.property_price),
            down_payment: round_currency(app.down_payment),
            loan_amount: round_currency(app.loan_amount),
            interest_rate: app.interest_rate,
            loan_period: app.loan_period,
            monthly_payment: round_currency(app.monthly_payment),
            total_payment: round_currency(app.total_payment),
            total_interest: round_currency(app.total_interest),
            ltv: round_ratio(app.ltv),
            applicant_name: app.applicant_name,
            applicant_phone: app.applicant_phone,
            applicant_email: app.applicant_email,
            applicant_income: round_currency(app.applicant_income),
            applicant_occupation: app.applicant_occupation,
            remarks: app.remarks,
            status: app.status,
            submitted_at: app.submitted_at,
            reviewed_at: app.reviewed_at,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        assert_eq!(round_currency(17_944.669_363), 17_944.67);
        assert_eq!(round_currency(0.004), 0.0);
        assert_eq!(round_ratio(0.833_333_3), 0.8333);
        assert_eq!(round_ratio(0.8), 0.8);
    }

    #[test]
    fn test_calculate_request_bounds() {
        let ok = CalculateRequest {
            property_price: 5_000_000.0,
            down_payment: 0.0,
            loan_period: 360,
            interest_rate: 20.0,
        };
        assert!(ok.validate().is_ok());

        let bad = CalculateRequest {
            property_price: 5_000_000.0,
            down_payment: -1.0,
            loan_period: 361,
            interest_rate: 0.0,
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("down_payment"));
        assert!(fields.contains_key("loan_period"));
        assert!(fields.contains_key("interest_rate"));
        assert!(!fields.contains_key("property_price"));

        let oversized = CalculateRequest {
            property_price: 5e11,
            down_payment: 1e11,
            loan_period: 360,
            interest_rate: 20.0,
        };
        let errors = oversized.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("property_price"));
    }

    #[test]
    fn test_apply_request_rejects_bad_email() {
        let request: ApplyRequest = serde_json::from_value(serde_json::json!({
            "bank_id": 1,
            "property_price": 5000000,
            "loan_amount": 4000000,
            "loan_period": 300,
            "interest_rate": 2.5,
            "applicant_name": "Chan Tai Man",
            "applicant_phone": "+852 5555 0000",
            "applicant_email": "not-an-email",
            "applicant_income": 120000
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("applicant_email"));
    }

    #[test]
    fn test_list_query_defaults() {
        let query: ApplicationListQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 20);
        assert_eq!(query.sort_by, ApplicationSortField::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);

        let domain = ApplicationQuery::from(&query);
        assert_eq!(domain, ApplicationQuery::default());
    }
}
