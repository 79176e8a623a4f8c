//! Port for item persistence.

use async_trait::async_trait;

use crate::domain::{
    Item, ItemChanges, ItemId, ItemWithStats, NewItem, PeriodWindow, RoomId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by item repository adapters.
    pub enum ItemRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "item repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "item repository query failed: {message}",
        /// No item has the requested id.
        NotFound => "item not found",
        /// The referenced room does not exist.
        RoomNotFound => "room not found",
        /// The target room already holds an item with this name in some casing.
        DuplicateName => "item name already exists in this room",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Items ordered by name, optionally restricted to one room.
    async fn list(&self, room: Option<RoomId>) -> Result<Vec<Item>, ItemRepositoryError>;

    /// Items with stroke statistics counted inside `window`.
    async fn list_with_stats(
        &self,
        room: Option<RoomId>,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<ItemWithStats>, ItemRepositoryError>;

    /// Fetch an item by id.
    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, ItemRepositoryError>;

    /// Create an item, copying the room name from the room row.
    async fn create(&self, item: &NewItem) -> Result<Item, ItemRepositoryError>;

    /// Apply changes. Moving rooms re-derives the room name and re-checks
    /// name uniqueness in the target room.
    async fn update(&self, id: ItemId, changes: &ItemChanges)
    -> Result<Item, ItemRepositoryError>;

    /// Delete an item and its strokes, returning how many strokes went.
    async fn delete(&self, id: ItemId) -> Result<u64, ItemRepositoryError>;
}
