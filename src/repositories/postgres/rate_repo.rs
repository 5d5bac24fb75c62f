//! PostgreSQL rate store.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff_diesel::ToDiesel;

use super::records::{BankRecord, RateRecord};
use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{Bank, MortgageRate, RateListing};
use crate::repositories::RateStore;
use crate::schema::{banks, mortgage_rates};

/// Banks and rates backed by the `banks` and `mortgage_rates` tables
#[derive(Clone)]
pub struct PgRateRepository {
    pool: AsyncDbPool,
}

impl PgRateRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

fn into_listings(rows: Vec<(RateRecord, BankRecord)>) -> AppResult<Vec<RateListing>> {
    rows.into_iter()
        .map(|(rate, bank)| {
            Ok(RateListing {
                rate: MortgageRate::try_from(rate)?,
                bank: Bank::from(bank),
            })
        })
        .collect()
}

#[async_trait]
impl RateStore for PgRateRepository {
    async fn find_bank(&self, bank_id: i32) -> AppResult<Option<Bank>> {
        let mut conn = self.pool.get().await?;

        banks::table
            .find(bank_id)
            .select(BankRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|bank| bank.map(Bank::from))
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find bank"))
    }

    async fn effective_rates(&self, at: jiff::Timestamp) -> AppResult<Vec<RateListing>> {
        let mut conn = self.pool.get().await?;

        let rows = mortgage_rates::table
            .inner_join(banks::table)
            .filter(banks::is_active.eq(true))
            .filter(mortgage_rates::effective_date.le(at.to_diesel()))
            .filter(
                mortgage_rates::expiry_date
                    .is_null()
                    .or(mortgage_rates::expiry_date.gt(at.to_diesel())),
            )
            .order(mortgage_rates::id.asc())
            .select((RateRecord::as_select(), BankRecord::as_select()))
            .load::<(RateRecord, BankRecord)>(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "load effective rates"))?;

        into_listings(rows)
    }

    async fn rates_by_bank(&self, bank_id: i32) -> AppResult<Vec<RateListing>> {
        let mut conn = self.pool.get().await?;

        let rows = mortgage_rates::table
            .inner_join(banks::table)
            .filter(mortgage_rates::bank_id.eq(bank_id))
            .order(mortgage_rates::id.asc())
            .select((RateRecord::as_select(), BankRecord::as_select()))
            .load::<(RateRecord, BankRecord)>(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "load bank rates"))?;

        into_listings(rows)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.pool.get().await?;

        diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>("1"))
            .get_result::<i32>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| AppError::Database {
                operation: "ping".to_string(),
                source: anyhow::Error::from(e),
            })
    }
}
