//! Mortgage application models.
//!
//! An application carries the financial snapshot computed when it was
//! submitted. Only `status`, `reviewed_at` and `updated_at` change afterwards.

use diesel_derive_enum::DbEnum;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::ApplicationStatus")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    /// pending → {under_review, withdrawn}; under_review → {approved, rejected, withdrawn}.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Pending, UnderReview)
                | (Pending, Withdrawn)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (UnderReview, Withdrawn)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }

    /// Whether reaching this status counts as a review decision.
    pub fn is_review_outcome(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved | ApplicationStatus::Rejected
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Application
// ============================================================================

/// A persisted mortgage application
#[derive(Debug, Clone, PartialEq)]
pub struct MortgageApplication {
    pub id: i64,
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
    pub submitted_at: Timestamp,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Everything needed to insert an application; the store assigns `id`,
/// `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMortgageApplication {
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
    pub submitted_at: Timestamp,
}

impl NewMortgageApplication {
    /// Materializes the stored row once the store has assigned an id.
    pub fn into_application(self, id: i64, now: Timestamp) -> MortgageApplication {
        MortgageApplication {
            id,
            application_no: self.application_no,
            user_id: self.user_id,
            bank_id: self.bank_id,
            property_id: self.property_id,
            property_price: self.property_price,
            down_payment: self.down_payment,
            loan_amount: self.loan_amount,
            interest_rate: self.interest_rate,
            loan_period: self.loan_period,
            monthly_payment: self.monthly_payment,
            total_payment: self.total_payment,
            total_interest: self.total_interest,
            ltv: self.ltv,
            applicant_name: self.applicant_name,
            applicant_phone: self.applicant_phone,
            applicant_email: self.applicant_email,
            applicant_income: self.applicant_income,
            applicant_occupation: self.applicant_occupation,
            remarks: self.remarks,
            status: self.status,
            submitted_at: self.submitted_at,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Listing filter
// ============================================================================

/// Sortable columns for application listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSortField {
    #[default]
    CreatedAt,
    SubmittedAt,
    LoanAmount,
    InterestRate,
    MonthlyPayment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Listing criteria; the owning user is passed separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub bank_id: Option<i32>,
    pub sort_by: ApplicationSortField,
    pub sort_order: SortOrder,
    pub offset: i64,
    pub limit: i64,
}

impl Default for ApplicationFilter {
    fn default() -> Self {
        Self {
            status: None,
            bank_id: None,
            sort_by: ApplicationSortField::default(),
            sort_order: SortOrder::default(),
            offset: 0,
            limit: 20,
        }
    }
}
