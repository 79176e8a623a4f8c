//! Port for room persistence.

use async_trait::async_trait;

use crate::domain::{NewRoom, Room, RoomChanges, RoomId, RoomSummary};

use super::define_port_error;

define_port_error! {
    /// Errors raised by room repository adapters.
    pub enum RoomRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "room repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "room repository query failed: {message}",
        /// No room has the requested id.
        NotFound => "room not found",
        /// Another room already uses the name in some casing.
        DuplicateName => "room name already exists",
        /// The room still holds items.
        NotEmpty { item_count: u64 } => "room still contains {item_count} items",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Rooms ordered by name with their item counts.
    async fn list_summaries(&self) -> Result<Vec<RoomSummary>, RoomRepositoryError>;

    /// Fetch a room by id.
    async fn find_by_id(&self, id: RoomId) -> Result<Option<Room>, RoomRepositoryError>;

    /// Create a room.
    async fn create(&self, room: &NewRoom) -> Result<Room, RoomRepositoryError>;

    /// Apply changes; a rename is copied onto every item in the room within
    /// the same transaction.
    async fn update(&self, id: RoomId, changes: &RoomChanges)
    -> Result<Room, RoomRepositoryError>;

    /// Delete an empty room. The emptiness check and the delete are atomic.
    async fn delete(&self, id: RoomId) -> Result<(), RoomRepositoryError>;
}
