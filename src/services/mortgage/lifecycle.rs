//! Creation, retrieval and status changes of mortgage applications.

use std::sync::Arc;

use jiff::Timestamp;

use super::application_no::ApplicationNumberGenerator;
use super::calculator;
use super::comparison::{
    MAX_AMOUNT, MAX_LOAN_PERIOD, MIN_LOAN_PERIOD, check_amount, check_interest_rate,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    ApplicationFilter, ApplicationSortField, ApplicationStatus, MortgageApplication,
    NewMortgageApplication, SortOrder,
};
use crate::repositories::{ApplicationStore, RateStore};

/// Applicant-supplied terms of a new application.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateApplicationCommand {
    pub bank_id: i32,
    pub property_id: Option<i64>,
    pub property_price: f64,
    pub loan_amount: f64,
    /// Annual percentage quoted to the applicant; stored as given.
    pub interest_rate: f64,
    pub loan_period: u32,
    pub applicant_name: String,
    pub applicant_phone: String,
    pub applicant_email: String,
    pub applicant_income: f64,
    pub applicant_occupation: Option<String>,
    pub remarks: Option<String>,
}

/// A page request over one user's applications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub status: Option<ApplicationStatus>,
    pub bank_id: Option<i32>,
    pub sort_by: ApplicationSortField,
    pub sort_order: SortOrder,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

impl Default for ApplicationQuery {
    fn default() -> Self {
        Self {
            status: None,
            bank_id: None,
            sort_by: ApplicationSortField::CreatedAt,
            sort_order: SortOrder::Desc,
            page: 1,
            page_size: 20,
        }
    }
}

impl ApplicationQuery {
    fn to_filter(&self) -> ApplicationFilter {
        let page = i64::from(self.page.max(1));
        let page_size = i64::from(self.page_size.max(1));
        ApplicationFilter {
            status: self.status,
            bank_id: self.bank_id,
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            offset: (page - 1) * page_size,
            limit: page_size,
        }
    }
}

#[derive(Clone)]
pub struct ApplicationLifecycleManager {
    rates: Arc<dyn RateStore>,
    applications: Arc<dyn ApplicationStore>,
    numbers: Arc<dyn ApplicationNumberGenerator>,
    max_attempts: u32,
}

impl ApplicationLifecycleManager {
    pub fn new(
        rates: Arc<dyn RateStore>,
        applications: Arc<dyn ApplicationStore>,
        numbers: Arc<dyn ApplicationNumberGenerator>,
        max_attempts: u32,
    ) -> Self {
        Self {
            rates,
            applications,
            numbers,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Stores a new `pending` application with its payment snapshot.
    pub async fn create_application(
        &self,
        user_id: i32,
        command: CreateApplicationCommand,
    ) -> AppResult<MortgageApplication> {
        check_terms(&command)?;

        if self.rates.find_bank(command.bank_id).await?.is_none() {
            return Err(AppError::not_found("bank", "id", command.bank_id));
        }

        let summary = calculator::summarize(
            command.loan_amount,
            command.interest_rate,
            command.loan_period,
        )?;
        let submitted_at = Timestamp::now();

        let draft = NewMortgageApplication {
            application_no: String::new(),
            user_id,
            bank_id: command.bank_id,
            property_id: command.property_id,
            property_price: command.property_price,
            down_payment: command.property_price - command.loan_amount,
            loan_amount: command.loan_amount,
            interest_rate: command.interest_rate,
            loan_period: command.loan_period as i32,
            monthly_payment: summary.monthly_payment,
            total_payment: summary.total_payment,
            total_interest: summary.total_interest,
            ltv: command.loan_amount / command.property_price,
            applicant_name: command.applicant_name,
            applicant_phone: command.applicant_phone,
            applicant_email: command.applicant_email,
            applicant_income: command.applicant_income,
            applicant_occupation: command.applicant_occupation,
            remarks: command.remarks,
            status: ApplicationStatus::Pending,
            submitted_at,
        };

        for attempt in 1..=self.max_attempts {
            let candidate = NewMortgageApplication {
                application_no: self.numbers.generate(submitted_at),
                ..draft.clone()
            };

            match self.applications.create(candidate).await {
                Ok(application) => {
                    tracing::info!(
                        application_id = application.id,
                        application_no = %application.application_no,
                        user_id,
                        bank_id = application.bank_id,
                        "Mortgage application submitted"
                    );
                    return Ok(application);
                }
                Err(e) if e.is_duplicate_of("application_no") => {
                    tracing::warn!(attempt, user_id, "Application number collision, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal {
            source: anyhow::anyhow!(
                "no unique application number after {} attempts",
                self.max_attempts
            ),
        })
    }

    /// Loads an application owned by `user_id`.
    pub async fn get_application(&self, user_id: i32, id: i64) -> AppResult<MortgageApplication> {
        let application = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("mortgage_application", "id", id))?;

        if application.user_id != user_id {
            return Err(AppError::Forbidden {
                message: "You do not have access to this application".to_string(),
            });
        }

        Ok(application)
    }

    /// One page of the caller's applications and the total count.
    pub async fn list_applications(
        &self,
        user_id: i32,
        query: &ApplicationQuery,
    ) -> AppResult<(Vec<MortgageApplication>, i64)> {
        self.applications
            .list_by_user(user_id, &query.to_filter())
            .await
    }

    /// Moves an owned application to `next` if the transition is allowed.
    pub async fn transition_status(
        &self,
        user_id: i32,
        id: i64,
        next: ApplicationStatus,
    ) -> AppResult<MortgageApplication> {
        let current = self.get_application(user_id, id).await?;

        if current.status.is_terminal() {
            return Err(AppError::UnprocessableContent {
                message: format!(
                    "Application {} is already {} and can no longer change",
                    current.application_no, current.status
                ),
            });
        }
        if !current.status.can_transition_to(next) {
            return Err(AppError::UnprocessableContent {
                message: format!(
                    "Application {} cannot move from {} to {}",
                    current.application_no, current.status, next
                ),
            });
        }

        let updated = self
            .applications
            .update_status(id, current.status, next, Timestamp::now())
            .await?
            .ok_or_else(|| AppError::Conflict {
                message: format!(
                    "Application {} changed status while being updated",
                    current.application_no
                ),
            })?;

        tracing::info!(
            application_id = id,
            application_no = %updated.application_no,
            user_id,
            from = %current.status,
            to = %next,
            "Mortgage application status changed"
        );

        Ok(updated)
    }
}

fn check_terms(command: &CreateApplicationCommand) -> AppResult<()> {
    check_amount("property_price", "Property price", command.property_price)?;
    check_amount("loan_amount", "Loan amount", command.loan_amount)?;
    if command.loan_amount > command.property_price {
        return Err(AppError::validation(
            "loan_amount",
            "Loan amount cannot exceed the property price",
        ));
    }
    if !(MIN_LOAN_PERIOD..=MAX_LOAN_PERIOD).contains(&command.loan_period) {
        return Err(AppError::validation(
            "loan_period",
            format!("Loan period must be between {MIN_LOAN_PERIOD} and {MAX_LOAN_PERIOD} months"),
        ));
    }
    check_interest_rate(command.interest_rate)?;
    if !(command.applicant_income.is_finite() && command.applicant_income >= 0.0) {
        return Err(AppError::validation(
            "applicant_income",
            "Applicant income cannot be negative",
        ));
    }
    if command.applicant_income > MAX_AMOUNT {
        return Err(AppError::validation(
            "applicant_income",
            format!("Applicant income must be at most {MAX_AMOUNT:.0}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repositories::memory::tests::sample_reference_data;
    use crate::repositories::{InMemoryApplicationStore, InMemoryRateStore};
    use crate::services::mortgage::application_no::RandomSuffixGenerator;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn command() -> CreateApplicationCommand {
        CreateApplicationCommand {
            bank_id: 1,
            property_id: Some(88),
            property_price: 5_000_000.0,
            loan_amount: 4_000_000.0,
            interest_rate: 2.5,
            loan_period: 300,
            applicant_name: "Chan Tai Man".to_string(),
            applicant_phone: "+852 5555 0000".to_string(),
            applicant_email: "chan@example.com".to_string(),
            applicant_income: 120_000.0,
            applicant_occupation: Some("Engineer".to_string()),
            remarks: None,
        }
    }

    /// Replays a fixed list of numbers, repeating the last one.
    struct ScriptedNumbers {
        numbers: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedNumbers {
        fn new(numbers: &[&str]) -> Self {
            Self {
                numbers: Mutex::new(numbers.iter().rev().map(|s| s.to_string()).collect()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ApplicationNumberGenerator for ScriptedNumbers {
        fn generate(&self, _at: Timestamp) -> String {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut numbers = self.numbers.lock().unwrap();
            if numbers.len() > 1 {
                numbers.pop().unwrap()
            } else {
                numbers[0].clone()
            }
        }
    }

    fn manager_with(numbers: Arc<dyn ApplicationNumberGenerator>, attempts: u32) -> ApplicationLifecycleManager {
        ApplicationLifecycleManager::new(
            Arc::new(InMemoryRateStore::new(sample_reference_data())),
            Arc::new(InMemoryApplicationStore::new()),
            numbers,
            attempts,
        )
    }

    fn manager() -> ApplicationLifecycleManager {
        manager_with(Arc::new(RandomSuffixGenerator::new("MA")), 5)
    }

    #[tokio::test]
    async fn test_create_is_pending_with_snapshot() {
        let manager = manager();
        let app = manager.create_application(7, command()).await.unwrap();

        assert_eq!(app.status, ApplicationStatus::Pending);
        assert_eq!(app.user_id, 7);
        assert_eq!(app.down_payment, 1_000_000.0);
        assert!((app.ltv - 0.8).abs() < 1e-12);
        let expected = calculator::summarize(4_000_000.0, 2.5, 300).unwrap();
        assert_eq!(app.monthly_payment, expected.monthly_payment);
        assert_eq!(app.total_interest, expected.total_interest);
        assert!(app.application_no.starts_with("MA"));
        assert_eq!(app.application_no.len(), 2 + 8 + 6);
        assert!(app.reviewed_at.is_none());
    }

    #[tokio::test]
    async fn test_other_users_are_forbidden_and_owner_sees_same_snapshot() {
        let manager = manager();
        let created = manager.create_application(7, command()).await.unwrap();

        assert!(matches!(
            manager.get_application(8, created.id).await,
            Err(AppError::Forbidden { .. })
        ));

        let fetched = manager.get_application(7, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_missing_application_is_not_found() {
        assert!(matches!(
            manager().get_application(7, 999).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_bank_is_not_found() {
        let mut cmd = command();
        cmd.bank_id = 404;
        assert!(matches!(
            manager().create_application(7, cmd).await,
            Err(AppError::NotFound { entity, .. }) if entity == "bank"
        ));
    }

    #[tokio::test]
    async fn test_loan_above_price_is_rejected() {
        let mut cmd = command();
        cmd.loan_amount = 6_000_000.0;
        assert!(matches!(
            manager().create_application(7, cmd).await,
            Err(AppError::Validation { field, .. }) if field == "loan_amount"
        ));
    }

    #[tokio::test]
    async fn test_terms_outside_storable_bounds_are_rejected() {
        let mut cmd = command();
        cmd.property_price = 5e11;
        cmd.loan_amount = 4e11;
        assert!(matches!(
            manager().create_application(7, cmd).await,
            Err(AppError::Validation { field, .. }) if field == "property_price"
        ));

        let mut cmd = command();
        cmd.applicant_income = MAX_AMOUNT * 10.0;
        assert!(matches!(
            manager().create_application(7, cmd).await,
            Err(AppError::Validation { field, .. }) if field == "applicant_income"
        ));

        let mut cmd = command();
        cmd.interest_rate = 2.1234567;
        assert!(matches!(
            manager().create_application(7, cmd).await,
            Err(AppError::Validation { field, .. }) if field == "interest_rate"
        ));

        let mut cmd = command();
        cmd.property_price = MAX_AMOUNT;
        cmd.loan_amount = MAX_AMOUNT;
        cmd.interest_rate = 20.0;
        cmd.loan_period = 360;
        let app = manager().create_application(7, cmd).await.unwrap();
        assert!(app.total_payment < 1e12);
    }

    #[tokio::test]
    async fn test_number_collision_is_retried() {
        let numbers = Arc::new(ScriptedNumbers::new(&[
            "MA20260101000001",
            "MA20260101000001",
            "MA20260101000002",
        ]));
        let manager = manager_with(numbers.clone(), 5);

        let first = manager.create_application(7, command()).await.unwrap();
        let second = manager.create_application(7, command()).await.unwrap();

        assert_eq!(first.application_no, "MA20260101000001");
        assert_eq!(second.application_no, "MA20260101000002");
        assert_eq!(numbers.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_are_internal() {
        let numbers = Arc::new(ScriptedNumbers::new(&["MA20260101000001"]));
        let manager = manager_with(numbers.clone(), 3);

        manager.create_application(7, command()).await.unwrap();
        assert!(matches!(
            manager.create_application(7, command()).await,
            Err(AppError::Internal { .. })
        ));
        assert_eq!(numbers.calls.load(Ordering::SeqCst), 1 + 3);
    }

    #[tokio::test]
    async fn test_withdraw_rules() {
        let manager = manager();
        let app = manager.create_application(7, command()).await.unwrap();

        assert!(matches!(
            manager.transition_status(8, app.id, ApplicationStatus::Withdrawn).await,
            Err(AppError::Forbidden { .. })
        ));

        let withdrawn = manager
            .transition_status(7, app.id, ApplicationStatus::Withdrawn)
            .await
            .unwrap();
        assert_eq!(withdrawn.status, ApplicationStatus::Withdrawn);
        assert_eq!(withdrawn.monthly_payment, app.monthly_payment);
        assert_eq!(withdrawn.application_no, app.application_no);

        assert!(matches!(
            manager.transition_status(7, app.id, ApplicationStatus::Withdrawn).await,
            Err(AppError::UnprocessableContent { message }) if message.contains("already withdrawn")
        ));
    }

    #[tokio::test]
    async fn test_pending_cannot_jump_to_approved() {
        let manager = manager();
        let app = manager.create_application(7, command()).await.unwrap();
        assert!(matches!(
            manager.transition_status(7, app.id, ApplicationStatus::Approved).await,
            Err(AppError::UnprocessableContent { .. })
        ));
    }

    #[tokio::test]
    async fn test_listing_is_scoped_and_paged() {
        let manager = manager();
        for _ in 0..3 {
            manager.create_application(7, command()).await.unwrap();
        }
        manager.create_application(8, command()).await.unwrap();

        let query = ApplicationQuery {
            page: 2,
            page_size: 2,
            ..Default::default()
        };
        let (page, total) = manager.list_applications(7, &query).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert!(page.iter().all(|a| a.user_id == 7));
    }

    #[test]
    fn test_query_to_filter_offsets() {
        let filter = ApplicationQuery {
            page: 3,
            page_size: 10,
            ..Default::default()
        }
        .to_filter();
        assert_eq!(filter.offset, 20);
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.sort_by, ApplicationSortField::CreatedAt);
        assert_eq!(filter.sort_order, SortOrder::Desc);
    }
}
