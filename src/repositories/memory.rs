//! Process-local stores for local runs and tests.
//!
//! Banks and rates are seeded from a reference-data TOML file; applications
//! live only as long as the process.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jiff::Timestamp;
use serde::Deserialize;

use crate::config::error::ConfigError;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApplicationFilter, ApplicationSortField, ApplicationStatus, Bank, MortgageApplication,
    MortgageRate, NewMortgageApplication, RateListing, SortOrder,
};
use crate::repositories::{ApplicationStore, RateStore};

// ============================================================================
// Reference data
// ============================================================================

/// Banks and rates as written in the reference-data file.
///
/// ```toml
/// [[banks]]
/// id = 1
/// code = "HSB"
/// name = "Harbour Savings Bank"
///
/// [[rates]]
/// id = 1
/// bank_id = 1
/// rate_type = "floating"
/// interest_rate = 2.5
/// effective_date = "2026-01-01T00:00:00Z"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferenceData {
    #[serde(default)]
    pub banks: Vec<Bank>,
    #[serde(default)]
    pub rates: Vec<MortgageRate>,
}

impl ReferenceData {
    /// Reads and checks a reference-data TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path.display().to_string()));
        }

        let data: ReferenceData = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(|e| {
                ConfigError::ParseError(format!(
                    "Invalid reference data in {}: {}",
                    path.display(),
                    e
                ))
            })?;

        data.validate()?;
        Ok(data)
    }

    /// Ids are unique, every rate points at a known bank and is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut bank_ids = HashSet::new();
        for bank in &self.banks {
            if !bank_ids.insert(bank.id) {
                return Err(ConfigError::validation(
                    "banks.id".to_string(),
                    format!("Duplicate bank id {}", bank.id),
                ));
            }
        }

        let mut rate_ids = HashSet::new();
        for rate in &self.rates {
            if !rate_ids.insert(rate.id) {
                return Err(ConfigError::validation(
                    "rates.id".to_string(),
                    format!("Duplicate rate id {}", rate.id),
                ));
            }
            if !bank_ids.contains(&rate.bank_id) {
                return Err(ConfigError::validation(
                    "rates.bank_id".to_string(),
                    format!("Rate {} references unknown bank {}", rate.id, rate.bank_id),
                ));
            }
            if !(rate.interest_rate.is_finite() && rate.interest_rate > 0.0) {
                return Err(ConfigError::validation(
                    "rates.interest_rate".to_string(),
                    format!("Rate {} must have a positive interest rate", rate.id),
                ));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Rate store
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryRateStore {
    banks: DashMap<i32, Bank>,
    rates: DashMap<i32, MortgageRate>,
}

impl InMemoryRateStore {
    pub fn new(data: ReferenceData) -> Self {
        let store = Self::default();
        for bank in data.banks {
            store.banks.insert(bank.id, bank);
        }
        for rate in data.rates {
            store.rates.insert(rate.id, rate);
        }
        store
    }

    fn listings<F>(&self, keep: F) -> Vec<RateListing>
    where
        F: Fn(&MortgageRate, &Bank) -> bool,
    {
        let mut listings: Vec<RateListing> = self
            .rates
            .iter()
            .filter_map(|entry| {
                let rate = entry.value();
                let bank = self.banks.get(&rate.bank_id)?;
                keep(rate, bank.value()).then(|| RateListing {
                    rate: rate.clone(),
                    bank: bank.value().clone(),
                })
            })
            .collect();
        listings.sort_by_key(|listing| listing.rate.id);
        listings
    }
}

#[async_trait]
impl RateStore for InMemoryRateStore {
    async fn find_bank(&self, bank_id: i32) -> AppResult<Option<Bank>> {
        Ok(self.banks.get(&bank_id).map(|bank| bank.value().clone()))
    }

    async fn effective_rates(&self, at: Timestamp) -> AppResult<Vec<RateListing>> {
        Ok(self.listings(|rate, bank| bank.is_active && rate.is_effective_at(at)))
    }

    async fn rates_by_bank(&self, bank_id: i32) -> AppResult<Vec<RateListing>> {
        Ok(self.listings(|rate, _| rate.bank_id == bank_id))
    }
}

// ============================================================================
// Application store
// ============================================================================

#[derive(Debug)]
pub struct InMemoryApplicationStore {
    rows: DashMap<i64, MortgageApplication>,
    numbers: DashMap<String, i64>,
    next_id: AtomicI64,
}

impl Default for InMemoryApplicationStore {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            numbers: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(a: &MortgageApplication, b: &MortgageApplication, field: ApplicationSortField) -> CmpOrdering {
    match field {
        ApplicationSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        ApplicationSortField::SubmittedAt => a.submitted_at.cmp(&b.submitted_at),
        ApplicationSortField::LoanAmount => a.loan_amount.total_cmp(&b.loan_amount),
        ApplicationSortField::InterestRate => a.interest_rate.total_cmp(&b.interest_rate),
        ApplicationSortField::MonthlyPayment => a.monthly_payment.total_cmp(&b.monthly_payment),
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn create(&self, application: NewMortgageApplication) -> AppResult<MortgageApplication> {
        // The number entry stays locked until the row is in place.
        match self.numbers.entry(application.application_no.clone()) {
            Entry::Occupied(occupied) => Err(AppError::Duplicate {
                entity: "mortgage_applications".to_string(),
                field: "application_no".to_string(),
                value: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let stored = application.into_application(id, Timestamp::now());
                self.rows.insert(id, stored.clone());
                vacant.insert(id);
                Ok(stored)
            }
        }
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<MortgageApplication>> {
        Ok(self.rows.get(&id).map(|row| row.value().clone()))
    }

    async fn list_by_user(
        &self,
        user_id: i32,
        filter: &ApplicationFilter,
    ) -> AppResult<(Vec<MortgageApplication>, i64)> {
        let mut matching: Vec<MortgageApplication> = self
            .rows
            .iter()
            .map(|row| row.value().clone())
            .filter(|app| app.user_id == user_id)
            .filter(|app| filter.status.is_none_or(|s| app.status == s))
            .filter(|app| filter.bank_id.is_none_or(|b| app.bank_id == b))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = compare(a, b, filter.sort_by).then(a.id.cmp(&b.id));
            match filter.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn update_status(
        &self,
        id: i64,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        at: Timestamp,
    ) -> AppResult<Option<MortgageApplication>> {
        let Some(mut row) = self.rows.get_mut(&id) else {
            return Ok(None);
        };
        if row.status != expected {
            return Ok(None);
        }

        row.status = next;
        row.updated_at = at;
        if next.is_review_outcome() {
            row.reviewed_at = Some(at);
        }
        Ok(Some(row.clone()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jiff::ToSpan;
    use std::sync::Arc;

    pub(crate) fn sample_reference_data() -> ReferenceData {
        let start: Timestamp = "2020-01-01T00:00:00Z".parse().unwrap();
        let bank = |id: i32, code: &str, active: bool| Bank {
            id,
            code: code.to_string(),
            name: format!("{code} Bank"),
            name_en: None,
            is_active: active,
        };
        let rate = |id: i32, bank_id: i32, interest_rate: f64| MortgageRate {
            id,
            bank_id,
            rate_type: crate::models::RateType::Floating,
            interest_rate,
            effective_date: start,
            expiry_date: None,
            processing_fee: None,
            description: None,
        };

        ReferenceData {
            banks: vec![bank(1, "AAA", true), bank(2, "BBB", true), bank(3, "OFF", false)],
            rates: vec![rate(1, 1, 3.1), rate(2, 2, 2.6), rate(3, 3, 1.0)],
        }
    }

    pub(crate) fn new_application(no: &str, user_id: i32) -> NewMortgageApplication {
        NewMortgageApplication {
            application_no: no.to_string(),
            user_id,
            bank_id: 1,
            property_id: None,
            property_price: 5_000_000.0,
            down_payment: 1_000_000.0,
            loan_amount: 4_000_000.0,
            interest_rate: 2.5,
            loan_period: 300,
            monthly_payment: 17_944.49,
            total_payment: 5_383_347.0,
            total_interest: 1_383_347.0,
            ltv: 0.8,
            applicant_name: "Chan Tai Man".to_string(),
            applicant_phone: "+852 5555 0000".to_string(),
            applicant_email: "chan@example.com".to_string(),
            applicant_income: 120_000.0,
            applicant_occupation: None,
            remarks: None,
            status: ApplicationStatus::Pending,
            submitted_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn test_effective_rates_skip_inactive_banks_and_expired_rates() {
        let mut data = sample_reference_data();
        let now = Timestamp::now();
        data.rates[0].expiry_date = Some(now - 1.hour());
        let store = InMemoryRateStore::new(data);

        let rates = store.effective_rates(now).await.unwrap();
        let ids: Vec<i32> = rates.iter().map(|l| l.rate.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_rates_by_bank_includes_all_validity() {
        let store = InMemoryRateStore::new(sample_reference_data());
        let rates = store.rates_by_bank(3).await.unwrap();
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].bank.code, "OFF");
        assert!(store.find_bank(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_application_no_is_rejected() {
        let store = InMemoryApplicationStore::new();
        store.create(new_application("MA20260101000001", 7)).await.unwrap();

        let err = store
            .create(new_application("MA20260101000001", 8))
            .await
            .unwrap_err();
        assert!(err.is_duplicate_of("application_no"));
    }

    #[tokio::test]
    async fn test_concurrent_creates_with_same_number_yield_one_row() {
        let store = Arc::new(InMemoryApplicationStore::new());
        let mut handles = Vec::new();
        for user in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(new_application("MA20260101424242", user)).await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
    }

    #[tokio::test]
    async fn test_update_status_is_compare_and_set() {
        let store = InMemoryApplicationStore::new();
        let app = store.create(new_application("MA20260101000002", 7)).await.unwrap();
        let now = Timestamp::now();

        let updated = store
            .update_status(app.id, ApplicationStatus::Pending, ApplicationStatus::UnderReview, now)
            .await
            .unwrap()
            .expect("status should change");
        assert_eq!(updated.status, ApplicationStatus::UnderReview);
        assert!(updated.reviewed_at.is_none());

        let stale = store
            .update_status(app.id, ApplicationStatus::Pending, ApplicationStatus::Withdrawn, now)
            .await
            .unwrap();
        assert!(stale.is_none());

        let approved = store
            .update_status(app.id, ApplicationStatus::UnderReview, ApplicationStatus::Approved, now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.reviewed_at, Some(now));
        assert_eq!(approved.monthly_payment, app.monthly_payment);
    }

    #[tokio::test]
    async fn test_list_by_user_filters_sorts_and_pages() {
        let store = InMemoryApplicationStore::new();
        for (i, amount) in [3_000_000.0, 1_000_000.0, 2_000_000.0].into_iter().enumerate() {
            let mut app = new_application(&format!("MA2026010100000{i}"), 7);
            app.loan_amount = amount;
            store.create(app).await.unwrap();
        }
        store.create(new_application("MA20260101999999", 8)).await.unwrap();

        let filter = ApplicationFilter {
            sort_by: ApplicationSortField::LoanAmount,
            sort_order: SortOrder::Asc,
            offset: 0,
            limit: 2,
            ..Default::default()
        };
        let (page, total) = store.list_by_user(7, &filter).await.unwrap();
        assert_eq!(total, 3);
        let amounts: Vec<f64> = page.iter().map(|a| a.loan_amount).collect();
        assert_eq!(amounts, vec![1_000_000.0, 2_000_000.0]);

        let filter = ApplicationFilter {
            status: Some(ApplicationStatus::Withdrawn),
            ..Default::default()
        };
        let (page, total) = store.list_by_user(7, &filter).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_reference_data_load_and_validate() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("reference.toml");
        std::fs::write(
            &path,
            r#"
[[banks]]
id = 1
code = "HSB"
name = "Harbour Savings Bank"

[[rates]]
id = 10
bank_id = 1
rate_type = "hybrid"
interest_rate = 2.75
effective_date = "2026-01-01T00:00:00Z"
processing_fee = 5000.0
"#,
        )
        .unwrap();

        let data = ReferenceData::load(&path).expect("reference data should load");
        assert_eq!(data.banks.len(), 1);
        assert!(data.banks[0].is_active);
        assert_eq!(data.rates[0].processing_fee, Some(5000.0));

        let mut broken = data.clone();
        broken.rates[0].bank_id = 2;
        assert!(broken.validate().is_err());
    }
}
