//! Published mortgage rate offers.

use diesel_derive_enum::DbEnum;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Bank;

/// Kind of rate a bank publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::RateType")]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    Fixed,
    Floating,
    Hybrid,
}

impl std::fmt::Display for RateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateType::Fixed => write!(f, "fixed"),
            RateType::Floating => write!(f, "floating"),
            RateType::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// A bank's rate offer with its validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageRate {
    pub id: i32,
    pub bank_id: i32,
    pub rate_type: RateType,
    /// Annual percentage, e.g. `2.5` for 2.5%.
    pub interest_rate: f64,
    pub effective_date: Timestamp,
    #[serde(default)]
    pub expiry_date: Option<Timestamp>,
    #[serde(default)]
    pub processing_fee: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MortgageRate {
    /// Effective from `effective_date` inclusive until `expiry_date` exclusive.
    pub fn is_effective_at(&self, at: Timestamp) -> bool {
        self.effective_date <= at && self.expiry_date.is_none_or(|expiry| expiry > at)
    }
}

/// A rate together with the bank that publishes it.
#[derive(Debug, Clone, PartialEq)]
pub struct RateListing {
    pub rate: MortgageRate,
    pub bank: Bank,
}
