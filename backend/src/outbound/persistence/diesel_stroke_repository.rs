//! PostgreSQL-backed `StrokeRepository`.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StrokeRepository, StrokeRepositoryError};
use crate::domain::{ItemId, NewStroke, PeriodWindow, Stroke, UserId};

use super::diesel_helpers::{DbFailure, affected_to_u64, count_to_u64, stroke_window};
use super::models::{NewStrokeRow, StrokeRow, convert_all};
use super::pool::DbPool;
use super::schema::strokes;

const ITEM_FK: &str = "strokes_item_id_fkey";
const USER_FK: &str = "strokes_user_id_fkey";

/// Diesel implementation of [`StrokeRepository`].
#[derive(Clone)]
pub struct DieselStrokeRepository {
    pool: DbPool,
}

impl DieselStrokeRepository {
    /// Create a repository over `pool`.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: DbFailure) -> StrokeRepositoryError {
    if failure.is_foreign_key_on(ITEM_FK) {
        return StrokeRepositoryError::item_not_found();
    }
    if failure.is_foreign_key_on(USER_FK) {
        return StrokeRepositoryError::user_not_found();
    }
    failure.into_port_error(
        StrokeRepositoryError::connection,
        StrokeRepositoryError::query,
    )
}

fn map_diesel(error: diesel::result::Error) -> StrokeRepositoryError {
    map_failure(error.into())
}

#[async_trait]
impl StrokeRepository for DieselStrokeRepository {
    async fn append(&self, stroke: &NewStroke) -> Result<Stroke, StrokeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row: StrokeRow = diesel::insert_into(strokes::table)
            .values(&NewStrokeRow {
                id: None,
                item_id: stroke.item_id.get(),
                user_id: Some(stroke.user_id.get()),
                username: stroke.username.as_ref(),
                created_at: stroke.created_at,
            })
            .returning(StrokeRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;
        row.into_stroke().map_err(StrokeRepositoryError::query)
    }

    async fn list_for_item(
        &self,
        item: ItemId,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<Stroke>, StrokeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let rows: Vec<StrokeRow> = strokes::table
            .filter(strokes::item_id.eq(item.get()))
            .filter(stroke_window(window))
            .order_by((strokes::created_at.desc(), strokes::id.desc()))
            .select(StrokeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        convert_all(rows, StrokeRow::into_stroke).map_err(StrokeRepositoryError::query)
    }

    async fn remove_for_item(
        &self,
        item: ItemId,
        window: Option<PeriodWindow>,
    ) -> Result<u64, StrokeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let removed = diesel::delete(
            strokes::table
                .filter(strokes::item_id.eq(item.get()))
                .filter(stroke_window(window)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel)?;
        Ok(affected_to_u64(removed))
    }

    async fn counts_for_user(
        &self,
        user: UserId,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<(ItemId, u64)>, StrokeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let rows: Vec<(i64, i64)> = strokes::table
            .filter(strokes::user_id.eq(user.get()))
            .filter(stroke_window(window))
            .group_by(strokes::item_id)
            .select((strokes::item_id, count_star()))
            .order_by(strokes::item_id)
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        Ok(rows
            .into_iter()
            .map(|(item_id, count)| (ItemId::new(item_id), count_to_u64(count)))
            .collect())
    }
}
