//! Room and item lifecycle.
//!
//! Storage enforces name uniqueness and the room/item relationships inside
//! transactions; this service owns the protected-room rule and the role-based
//! projection of item listings.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use super::billing_service::resolve_window;
use super::ports::{
    BillingPeriodRepository, Catalogue, ItemDraft, ItemRepository, RoomRepository, UserRepository,
};
use super::repository_errors::{map_item_error, map_room_error, map_user_error};
use super::{
    Caller, DEFAULT_ROOM_ID, Description, Error, Item, ItemChanges, ItemId, ItemListing,
    MemberItem, NewItem, NewRoom, PeriodSelector, Room, RoomChanges, RoomId, RoomName,
    RoomSummary,
};

/// Service implementing [`Catalogue`].
#[derive(Clone)]
pub struct CatalogueService<R, I, U, B> {
    rooms: Arc<R>,
    items: Arc<I>,
    users: Arc<U>,
    periods: Arc<B>,
    clock: Arc<dyn Clock>,
}

/// Repositories the catalogue service reads and writes.
pub struct CatalogueRepositories<R, I, U, B> {
    pub rooms: Arc<R>,
    pub items: Arc<I>,
    pub users: Arc<U>,
    pub periods: Arc<B>,
}

impl<R, I, U, B> CatalogueService<R, I, U, B> {
    /// Create a service over the given repositories.
    pub fn new(repositories: CatalogueRepositories<R, I, U, B>, clock: Arc<dyn Clock>) -> Self {
        let CatalogueRepositories {
            rooms,
            items,
            users,
            periods,
        } = repositories;
        Self {
            rooms,
            items,
            users,
            periods,
            clock,
        }
    }
}

impl<R, I, U, B> CatalogueService<R, I, U, B>
where
    R: RoomRepository,
    I: ItemRepository,
{
    async fn existing_room(&self, id: RoomId) -> Result<Room, Error> {
        self.rooms
            .find_by_id(id)
            .await
            .map_err(map_room_error)?
            .ok_or_else(|| Error::not_found("room not found"))
    }

    async fn existing_item(&self, id: ItemId) -> Result<Item, Error> {
        self.items
            .find_by_id(id)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| Error::not_found("item not found"))
    }
}

#[async_trait]
impl<R, I, U, B> Catalogue for CatalogueService<R, I, U, B>
where
    R: RoomRepository,
    I: ItemRepository,
    U: UserRepository,
    B: BillingPeriodRepository,
{
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, Error> {
        self.rooms.list_summaries().await.map_err(map_room_error)
    }

    async fn create_room(
        &self,
        caller: &Caller,
        name: RoomName,
        description: Description,
    ) -> Result<Room, Error> {
        let room = self
            .rooms
            .create(&NewRoom {
                name,
                description,
                created_by: Some(caller.user_id),
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_room_error)?;
        info!(room_id = %room.id, name = %room.name, "room created");
        Ok(room)
    }

    async fn update_room(&self, id: RoomId, changes: RoomChanges) -> Result<Room, Error> {
        if changes.name.is_none() && changes.description.is_none() {
            return self.existing_room(id).await;
        }
        let room = self
            .rooms
            .update(id, &changes)
            .await
            .map_err(map_room_error)?;
        info!(room_id = %id, renamed = changes.name.is_some(), "room updated");
        Ok(room)
    }

    async fn delete_room(&self, id: RoomId) -> Result<(), Error> {
        if id == DEFAULT_ROOM_ID {
            return Err(Error::forbidden("the default room cannot be deleted")
                .with_details(json!({ "code": "protected_room" })));
        }
        self.rooms.delete(id).await.map_err(map_room_error)?;
        info!(room_id = %id, "room deleted");
        Ok(())
    }

    async fn list_items(
        &self,
        caller: &Caller,
        room: Option<RoomId>,
        period: PeriodSelector,
    ) -> Result<ItemListing, Error> {
        // The projection follows the stored role, not the token claim.
        let is_admin = self
            .users
            .find_by_id(caller.user_id)
            .await
            .map_err(map_user_error)?
            .is_some_and(|user| user.role.is_admin());
        if !is_admin {
            let items = self.items.list(room).await.map_err(map_item_error)?;
            return Ok(ItemListing::Member(
                items.into_iter().map(MemberItem::from).collect(),
            ));
        }
        let window = resolve_window(self.periods.as_ref(), period).await?;
        let items = self
            .items
            .list_with_stats(room, window)
            .await
            .map_err(map_item_error)?;
        Ok(ItemListing::Admin(items))
    }

    async fn create_item(&self, caller: &Caller, draft: ItemDraft) -> Result<Item, Error> {
        let ItemDraft {
            name,
            description,
            room_id,
            price,
        } = draft;
        let item = self
            .items
            .create(&NewItem {
                name,
                description,
                room_id,
                price,
                created_by: Some(caller.user_id),
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_item_error)?;
        info!(item_id = %item.id, room_id = %item.room_id, "item created");
        Ok(item)
    }

    async fn update_item(&self, id: ItemId, changes: ItemChanges) -> Result<Item, Error> {
        if changes.is_empty() {
            return self.existing_item(id).await;
        }
        let item = self
            .items
            .update(id, &changes)
            .await
            .map_err(map_item_error)?;
        info!(item_id = %id, moved = changes.room_id.is_some(), "item updated");
        Ok(item)
    }

    async fn delete_item(&self, id: ItemId) -> Result<u64, Error> {
        let removed = self.items.delete(id).await.map_err(map_item_error)?;
        info!(item_id = %id, removed_strokes = removed, "item deleted");
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "catalogue_service_tests.rs"]
mod tests;
