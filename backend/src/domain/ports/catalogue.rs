//! Driving port for room and item lifecycle use-cases.

use async_trait::async_trait;

use crate::domain::{
    Caller, Description, Error, Item, ItemChanges, ItemId, ItemListing, ItemName, PeriodSelector,
    Price, Room, RoomChanges, RoomId, RoomName, RoomSummary,
};

/// Validated item creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: ItemName,
    pub description: Description,
    pub room_id: RoomId,
    pub price: Price,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Catalogue: Send + Sync {
    /// Rooms ordered by name, each with its item count.
    async fn list_rooms(&self) -> Result<Vec<RoomSummary>, Error>;

    /// Create a room.
    async fn create_room(
        &self,
        caller: &Caller,
        name: RoomName,
        description: Description,
    ) -> Result<Room, Error>;

    /// Rename or re-describe a room.
    async fn update_room(&self, id: RoomId, changes: RoomChanges) -> Result<Room, Error>;

    /// Delete an empty, non-default room.
    async fn delete_room(&self, id: RoomId) -> Result<(), Error>;

    /// Items ordered by name, projected for the caller's stored role.
    async fn list_items(
        &self,
        caller: &Caller,
        room: Option<RoomId>,
        period: PeriodSelector,
    ) -> Result<ItemListing, Error>;

    /// Create an item in an existing room.
    async fn create_item(&self, caller: &Caller, draft: ItemDraft) -> Result<Item, Error>;

    /// Edit or move an item.
    async fn update_item(&self, id: ItemId, changes: ItemChanges) -> Result<Item, Error>;

    /// Delete an item and its strokes, returning the number of strokes removed.
    async fn delete_item(&self, id: ItemId) -> Result<u64, Error>;
}
