//! PostgreSQL-backed `RoomRepository`.
//!
//! Updates and deletes lock the room row `FOR UPDATE`. Item writes take a
//! `FOR SHARE` lock on their room, so a delete cannot interleave with an
//! item being created in the same room.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, RunQueryDsl};

use crate::domain::ports::{RoomRepository, RoomRepositoryError};
use crate::domain::{NewRoom, Room, RoomChanges, RoomId, RoomSummary};

use super::diesel_helpers::{DbFailure, TxError, count_to_u64};
use super::models::{NewRoomRow, RoomRow, RoomUpdate, convert_all};
use super::pool::DbPool;
use super::schema::{items, rooms};

const NAME_KEY: &str = "rooms_name_key";

/// Diesel implementation of [`RoomRepository`].
#[derive(Clone)]
pub struct DieselRoomRepository {
    pool: DbPool,
}

impl DieselRoomRepository {
    /// Create a repository over `pool`.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: DbFailure) -> RoomRepositoryError {
    if failure.is_unique_on(NAME_KEY) {
        return RoomRepositoryError::duplicate_name();
    }
    failure.into_port_error(RoomRepositoryError::connection, RoomRepositoryError::query)
}

fn map_diesel(error: diesel::result::Error) -> RoomRepositoryError {
    map_failure(error.into())
}

#[async_trait]
impl RoomRepository for DieselRoomRepository {
    async fn list_summaries(&self) -> Result<Vec<RoomSummary>, RoomRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let rows: Vec<RoomRow> = rooms::table
            .select(RoomRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        let counts: HashMap<i64, i64> = items::table
            .group_by(items::room_id)
            .select((items::room_id, diesel::dsl::count_star()))
            .load::<(i64, i64)>(&mut conn)
            .await
            .map_err(map_diesel)?
            .into_iter()
            .collect();

        let mut summaries: Vec<RoomSummary> = convert_all(rows, RoomRow::into_room)
            .map_err(RoomRepositoryError::query)?
            .into_iter()
            .map(|room| RoomSummary {
                item_count: count_to_u64(counts.get(&room.id.get()).copied().unwrap_or_default()),
                room,
            })
            .collect();
        summaries.sort_by(|a, b| {
            a.room
                .name
                .folded()
                .cmp(&b.room.name.folded())
                .then_with(|| a.room.id.cmp(&b.room.id))
        });
        Ok(summaries)
    }

    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RoomRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = rooms::table
            .find(id.get())
            .select(RoomRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(RoomRow::into_room)
            .transpose()
            .map_err(RoomRepositoryError::query)
    }

    async fn create(&self, room: &NewRoom) -> Result<Room, RoomRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row: RoomRow = diesel::insert_into(rooms::table)
            .values(&NewRoomRow {
                id: None,
                name: room.name.as_ref(),
                description: room.description.as_ref(),
                created_at: room.created_at,
                created_by: room.created_by.map(|id| id.get()),
            })
            .returning(RoomRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;
        row.into_room().map_err(RoomRepositoryError::query)
    }

    async fn update(
        &self,
        id: RoomId,
        changes: &RoomChanges,
    ) -> Result<Room, RoomRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let update = RoomUpdate {
            name: changes.name.as_ref().map(AsRef::as_ref),
            description: changes.description.as_ref().map(AsRef::as_ref),
        };
        let row = conn
            .transaction::<_, TxError<RoomRepositoryError>, _>(|conn| {
                async move {
                    let current: Option<RoomRow> = rooms::table
                        .find(id.get())
                        .select(RoomRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let current =
                        current.ok_or_else(|| TxError::Refused(RoomRepositoryError::not_found()))?;
                    if update.name.is_none() && update.description.is_none() {
                        return Ok(current);
                    }
                    let updated: RoomRow = diesel::update(rooms::table.find(id.get()))
                        .set(&update)
                        .returning(RoomRow::as_returning())
                        .get_result(conn)
                        .await?;
                    if let Some(name) = update.name {
                        diesel::update(items::table.filter(items::room_id.eq(id.get())))
                            .set(items::room_name.eq(name))
                            .execute(conn)
                            .await?;
                    }
                    Ok(updated)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| error.resolve(map_failure))?;
        row.into_room().map_err(RoomRepositoryError::query)
    }

    async fn delete(&self, id: RoomId) -> Result<(), RoomRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        conn.transaction::<_, TxError<RoomRepositoryError>, _>(|conn| {
            async move {
                let locked: Option<i64> = rooms::table
                    .find(id.get())
                    .select(rooms::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if locked.is_none() {
                    return Err(TxError::Refused(RoomRepositoryError::not_found()));
                }
                let item_count: i64 = items::table
                    .filter(items::room_id.eq(id.get()))
                    .count()
                    .get_result(conn)
                    .await?;
                if item_count > 0 {
                    return Err(TxError::Refused(RoomRepositoryError::not_empty(
                        count_to_u64(item_count),
                    )));
                }
                diesel::delete(rooms::table.find(id.get()))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| error.resolve(map_failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn name_index_violation_is_a_duplicate() {
        let failure = DbFailure::Unique {
            constraint: Some(NAME_KEY.to_owned()),
        };
        assert_eq!(map_failure(failure), RoomRepositoryError::DuplicateName);
    }

    #[rstest]
    fn other_failures_are_query_errors() {
        let failure = DbFailure::Query("syntax".to_owned());
        assert!(matches!(
            map_failure(failure),
            RoomRepositoryError::Query { .. }
        ));
    }
}
