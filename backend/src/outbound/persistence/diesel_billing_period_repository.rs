//! PostgreSQL-backed `BillingPeriodRepository`.
//!
//! The partial unique index `billing_periods_single_active` guarantees a
//! single active row; activation clears the old flag before setting the new
//! one inside one transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{BillingPeriodRepository, BillingPeriodRepositoryError};
use crate::domain::{BillingPeriod, BillingPeriodId, NewBillingPeriod};

use super::diesel_helpers::{DbFailure, TxError};
use super::models::{BillingPeriodRow, NewBillingPeriodRow, convert_all};
use super::pool::DbPool;
use super::schema::billing_periods;

/// Diesel implementation of [`BillingPeriodRepository`].
#[derive(Clone)]
pub struct DieselBillingPeriodRepository {
    pool: DbPool,
}

impl DieselBillingPeriodRepository {
    /// Create a repository over `pool`.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: DbFailure) -> BillingPeriodRepositoryError {
    failure.into_port_error(
        BillingPeriodRepositoryError::connection,
        BillingPeriodRepositoryError::query,
    )
}

fn map_diesel(error: diesel::result::Error) -> BillingPeriodRepositoryError {
    map_failure(error.into())
}

fn to_domain(row: BillingPeriodRow) -> Result<BillingPeriod, BillingPeriodRepositoryError> {
    row.into_period().map_err(BillingPeriodRepositoryError::query)
}

async fn deactivate_others(
    conn: &mut AsyncPgConnection,
    keep: Option<i64>,
) -> Result<(), diesel::result::Error> {
    let active = billing_periods::table.filter(billing_periods::is_active.eq(true));
    match keep {
        Some(id) => {
            diesel::update(active.filter(billing_periods::id.ne(id)))
                .set(billing_periods::is_active.eq(false))
                .execute(conn)
                .await?;
        }
        None => {
            diesel::update(active)
                .set(billing_periods::is_active.eq(false))
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl BillingPeriodRepository for DieselBillingPeriodRepository {
    async fn create(
        &self,
        period: &NewBillingPeriod,
        activate: bool,
    ) -> Result<BillingPeriod, BillingPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    if activate {
                        deactivate_others(conn, None).await?;
                    }
                    diesel::insert_into(billing_periods::table)
                        .values(&NewBillingPeriodRow {
                            name: period.name.as_ref(),
                            start_date: period.range.start(),
                            end_date: period.range.end(),
                            is_active: activate,
                            created_at: period.created_at,
                            created_by: period.created_by.map(|id| id.get()),
                        })
                        .returning(BillingPeriodRow::as_returning())
                        .get_result(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;
        to_domain(row)
    }

    async fn activate(
        &self,
        id: BillingPeriodId,
    ) -> Result<BillingPeriod, BillingPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = conn
            .transaction::<_, TxError<BillingPeriodRepositoryError>, _>(|conn| {
                async move {
                    let exists: Option<i64> = billing_periods::table
                        .find(id.get())
                        .select(billing_periods::id)
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    if exists.is_none() {
                        return Err(TxError::Refused(BillingPeriodRepositoryError::not_found()));
                    }
                    deactivate_others(conn, Some(id.get())).await?;
                    let activated: BillingPeriodRow =
                        diesel::update(billing_periods::table.find(id.get()))
                            .set(billing_periods::is_active.eq(true))
                            .returning(BillingPeriodRow::as_returning())
                            .get_result(conn)
                            .await?;
                    Ok(activated)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| error.resolve(map_failure))?;
        to_domain(row)
    }

    async fn list(&self) -> Result<Vec<BillingPeriod>, BillingPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let rows: Vec<BillingPeriodRow> = billing_periods::table
            .select(BillingPeriodRow::as_select())
            .order_by((billing_periods::created_at.desc(), billing_periods::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        convert_all(rows, BillingPeriodRow::into_period).map_err(BillingPeriodRepositoryError::query)
    }

    async fn find_by_id(
        &self,
        id: BillingPeriodId,
    ) -> Result<Option<BillingPeriod>, BillingPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = billing_periods::table
            .find(id.get())
            .select(BillingPeriodRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(to_domain).transpose()
    }

    async fn find_active(&self) -> Result<Option<BillingPeriod>, BillingPeriodRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = billing_periods::table
            .filter(billing_periods::is_active.eq(true))
            .select(BillingPeriodRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(to_domain).transpose()
    }
}
