//! PostgreSQL-backed `ItemRepository`.
//!
//! Item writes lock the target room `FOR SHARE` and copy its name into
//! `items.room_name` in the same transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{ItemRepository, ItemRepositoryError};
use crate::domain::{
    Item, ItemChanges, ItemId, ItemStats, ItemWithStats, NewItem, PeriodWindow, RoomId,
};

use super::diesel_helpers::{DbFailure, TxError, affected_to_u64, count_to_u64, stroke_window};
use super::models::{ItemRow, ItemUpdate, NewItemRow, convert_all};
use super::pool::DbPool;
use super::schema::{items, rooms, strokes};

const ROOM_NAME_KEY: &str = "items_room_name_key";
const ROOM_FK: &str = "items_room_id_fkey";

/// Diesel implementation of [`ItemRepository`].
#[derive(Clone)]
pub struct DieselItemRepository {
    pool: DbPool,
}

impl DieselItemRepository {
    /// Create a repository over `pool`.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_items(
        conn: &mut AsyncPgConnection,
        room: Option<RoomId>,
    ) -> Result<Vec<Item>, ItemRepositoryError> {
        let mut query = items::table.select(ItemRow::as_select()).into_boxed();
        if let Some(room) = room {
            query = query.filter(items::room_id.eq(room.get()));
        }
        let rows: Vec<ItemRow> = query.load(conn).await.map_err(map_diesel)?;
        let mut loaded = convert_all(rows, ItemRow::into_item).map_err(ItemRepositoryError::query)?;
        loaded.sort_by(|a, b| {
            a.name
                .folded()
                .cmp(&b.name.folded())
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(loaded)
    }
}

fn map_failure(failure: DbFailure) -> ItemRepositoryError {
    if failure.is_unique_on(ROOM_NAME_KEY) {
        return ItemRepositoryError::duplicate_name();
    }
    if failure.is_foreign_key_on(ROOM_FK) {
        return ItemRepositoryError::room_not_found();
    }
    failure.into_port_error(ItemRepositoryError::connection, ItemRepositoryError::query)
}

fn map_diesel(error: diesel::result::Error) -> ItemRepositoryError {
    map_failure(error.into())
}

/// Name of `room`, locked `FOR SHARE` until the transaction ends.
async fn share_lock_room(
    conn: &mut AsyncPgConnection,
    room: RoomId,
) -> Result<String, TxError<ItemRepositoryError>> {
    let name: Option<String> = rooms::table
        .find(room.get())
        .select(rooms::name)
        .for_share()
        .first(conn)
        .await
        .optional()?;
    name.ok_or_else(|| TxError::Refused(ItemRepositoryError::room_not_found()))
}

#[async_trait]
impl ItemRepository for DieselItemRepository {
    async fn list(&self, room: Option<RoomId>) -> Result<Vec<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        Self::load_items(&mut conn, room).await
    }

    async fn list_with_stats(
        &self,
        room: Option<RoomId>,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<ItemWithStats>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let listed = Self::load_items(&mut conn, room).await?;
        let ids: Vec<i64> = listed.iter().map(|item| item.id.get()).collect();
        let stats: HashMap<i64, ItemStats> = strokes::table
            .filter(stroke_window(window))
            .filter(strokes::item_id.eq_any(ids))
            .group_by(strokes::item_id)
            .select((strokes::item_id, count_star(), diesel::dsl::max(strokes::created_at)))
            .load::<(i64, i64, Option<DateTime<Utc>>)>(&mut conn)
            .await
            .map_err(map_diesel)?
            .into_iter()
            .map(|(item_id, count, last_stroke)| {
                (
                    item_id,
                    ItemStats {
                        stroke_count: count_to_u64(count),
                        last_stroke,
                    },
                )
            })
            .collect();
        Ok(listed
            .into_iter()
            .map(|item| ItemWithStats {
                stats: stats.get(&item.id.get()).copied().unwrap_or_default(),
                item,
            })
            .collect())
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = items::table
            .find(id.get())
            .select(ItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(ItemRow::into_item)
            .transpose()
            .map_err(ItemRepositoryError::query)
    }

    async fn create(&self, item: &NewItem) -> Result<Item, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = conn
            .transaction::<_, TxError<ItemRepositoryError>, _>(|conn| {
                async move {
                    let room_name = share_lock_room(conn, item.room_id).await?;
                    let inserted: ItemRow = diesel::insert_into(items::table)
                        .values(&NewItemRow {
                            id: None,
                            name: item.name.as_ref(),
                            description: item.description.as_ref(),
                            room_id: item.room_id.get(),
                            room_name: &room_name,
                            price_cents: item.price.cents(),
                            created_at: item.created_at,
                            created_by: item.created_by.map(|id| id.get()),
                        })
                        .returning(ItemRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(inserted)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| error.resolve(map_failure))?;
        row.into_item().map_err(ItemRepositoryError::query)
    }

    async fn update(
        &self,
        id: ItemId,
        changes: &ItemChanges,
    ) -> Result<Item, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = conn
            .transaction::<_, TxError<ItemRepositoryError>, _>(|conn| {
                async move {
                    let current: Option<ItemRow> = items::table
                        .find(id.get())
                        .select(ItemRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let current =
                        current.ok_or_else(|| TxError::Refused(ItemRepositoryError::not_found()))?;
                    if changes.is_empty() {
                        return Ok(current);
                    }
                    let room_name = match changes.room_id {
                        Some(room) => Some(share_lock_room(conn, room).await?),
                        None => None,
                    };
                    let update = ItemUpdate {
                        name: changes.name.as_ref().map(AsRef::as_ref),
                        description: changes.description.as_ref().map(AsRef::as_ref),
                        room_id: changes.room_id.map(RoomId::get),
                        room_name: room_name.as_deref(),
                        price_cents: changes.price.map(|price| price.cents()),
                    };
                    let updated: ItemRow = diesel::update(items::table.find(id.get()))
                        .set(&update)
                        .returning(ItemRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(updated)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| error.resolve(map_failure))?;
        row.into_item().map_err(ItemRepositoryError::query)
    }

    async fn delete(&self, id: ItemId) -> Result<u64, ItemRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        conn.transaction::<_, TxError<ItemRepositoryError>, _>(|conn| {
            async move {
                let locked: Option<i64> = items::table
                    .find(id.get())
                    .select(items::id)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                if locked.is_none() {
                    return Err(TxError::Refused(ItemRepositoryError::not_found()));
                }
                let removed = diesel::delete(strokes::table.filter(strokes::item_id.eq(id.get())))
                    .execute(conn)
                    .await?;
                diesel::delete(items::table.find(id.get()))
                    .execute(conn)
                    .await?;
                Ok(affected_to_u64(removed))
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| error.resolve(map_failure))
    }
}
