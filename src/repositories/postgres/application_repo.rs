//! PostgreSQL application store.

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::Timestamp;
use jiff_diesel::ToDiesel;

use super::records::{ApplicationRecord, NewApplicationRecord};
use crate::db::AsyncDbPool;
use crate::error::{AppResult, DatabaseErrorConverter};
use crate::models::{
    ApplicationFilter, ApplicationSortField, ApplicationStatus, MortgageApplication,
    NewMortgageApplication, SortOrder,
};
use crate::repositories::ApplicationStore;
use crate::schema::mortgage_applications;
use crate::schema::mortgage_applications::dsl;

/// Applications backed by the `mortgage_applications` table
#[derive(Clone)]
pub struct PgApplicationRepository {
    pool: AsyncDbPool,
}

impl PgApplicationRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

/// Rows owned by `user_id` that match the filter's criteria.
fn filtered(
    user_id: i32,
    filter: &ApplicationFilter,
) -> mortgage_applications::BoxedQuery<'static, Pg> {
    let mut query = dsl::mortgage_applications
        .filter(dsl::user_id.eq(user_id))
        .into_boxed();

    if let Some(status) = filter.status {
        query = query.filter(dsl::status.eq(status));
    }
    if let Some(bank_id) = filter.bank_id {
        query = query.filter(dsl::bank_id.eq(bank_id));
    }

    query
}

fn ordered(
    query: mortgage_applications::BoxedQuery<'static, Pg>,
    sort_by: ApplicationSortField,
    sort_order: SortOrder,
) -> mortgage_applications::BoxedQuery<'static, Pg> {
    let query = match (sort_by, sort_order) {
        (ApplicationSortField::CreatedAt, SortOrder::Asc) => query.order(dsl::created_at.asc()),
        (ApplicationSortField::CreatedAt, SortOrder::Desc) => query.order(dsl::created_at.desc()),
        (ApplicationSortField::SubmittedAt, SortOrder::Asc) => {
            query.order(dsl::submitted_at.asc())
        }
        (ApplicationSortField::SubmittedAt, SortOrder::Desc) => {
            query.order(dsl::submitted_at.desc())
        }
        (ApplicationSortField::LoanAmount, SortOrder::Asc) => query.order(dsl::loan_amount.asc()),
        (ApplicationSortField::LoanAmount, SortOrder::Desc) => {
            query.order(dsl::loan_amount.desc())
        }
        (ApplicationSortField::InterestRate, SortOrder::Asc) => {
            query.order(dsl::interest_rate.asc())
        }
        (ApplicationSortField::InterestRate, SortOrder::Desc) => {
            query.order(dsl::interest_rate.desc())
        }
        (ApplicationSortField::MonthlyPayment, SortOrder::Asc) => {
            query.order(dsl::monthly_payment.asc())
        }
        (ApplicationSortField::MonthlyPayment, SortOrder::Desc) => {
            query.order(dsl::monthly_payment.desc())
        }
    };

    // Tie-break on id so pages never overlap.
    match sort_order {
        SortOrder::Asc => query.then_order_by(dsl::id.asc()),
        SortOrder::Desc => query.then_order_by(dsl::id.desc()),
    }
}

#[async_trait]
impl ApplicationStore for PgApplicationRepository {
    async fn create(&self, application: NewMortgageApplication) -> AppResult<MortgageApplication> {
        let record = NewApplicationRecord::try_from(application)?;
        let mut conn = self.pool.get().await?;

        let inserted = diesel::insert_into(dsl::mortgage_applications)
            .values(&record)
            .returning(ApplicationRecord::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "insert application"))?;

        MortgageApplication::try_from(inserted)
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<MortgageApplication>> {
        let mut conn = self.pool.get().await?;

        dsl::mortgage_applications
            .find(id)
            .select(ApplicationRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find application"))?
            .map(MortgageApplication::try_from)
            .transpose()
    }

    async fn list_by_user(
        &self,
        user_id: i32,
        filter: &ApplicationFilter,
    ) -> AppResult<(Vec<MortgageApplication>, i64)> {
        let mut conn = self.pool.get().await?;

        let records = ordered(filtered(user_id, filter), filter.sort_by, filter.sort_order)
            .offset(filter.offset)
            .limit(filter.limit)
            .select(ApplicationRecord::as_select())
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list applications"))?;

        let total = filtered(user_id, filter)
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "count applications"))?;

        let applications = records
            .into_iter()
            .map(MortgageApplication::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((applications, total))
    }

    async fn update_status(
        &self,
        id: i64,
        expected: ApplicationStatus,
        next: ApplicationStatus,
        at: Timestamp,
    ) -> AppResult<Option<MortgageApplication>> {
        let mut conn = self.pool.get().await?;
        let target = dsl::mortgage_applications
            .filter(dsl::id.eq(id))
            .filter(dsl::status.eq(expected));

        let updated = if next.is_review_outcome() {
            diesel::update(target)
                .set((
                    dsl::status.eq(next),
                    dsl::reviewed_at.eq(Some(at.to_diesel())),
                    dsl::updated_at.eq(at.to_diesel()),
                ))
                .returning(ApplicationRecord::as_returning())
                .get_result(&mut conn)
                .await
        } else {
            diesel::update(target)
                .set((dsl::status.eq(next), dsl::updated_at.eq(at.to_diesel())))
                .returning(ApplicationRecord::as_returning())
                .get_result(&mut conn)
                .await
        };

        updated
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "update application status"))?
            .map(MortgageApplication::try_from)
            .transpose()
    }
}
