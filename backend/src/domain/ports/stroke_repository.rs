//! Port for the stroke ledger.

use async_trait::async_trait;

use crate::domain::{ItemId, NewStroke, PeriodWindow, Stroke, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by stroke repository adapters.
    pub enum StrokeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "stroke repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "stroke repository query failed: {message}",
        /// The item was removed before the stroke could be recorded.
        ItemNotFound => "item not found",
        /// The account was removed before the stroke could be recorded.
        UserNotFound => "user not found",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StrokeRepository: Send + Sync {
    /// Append a stroke.
    async fn append(&self, stroke: &NewStroke) -> Result<Stroke, StrokeRepositoryError>;

    /// Strokes of one item inside `window`, newest first.
    async fn list_for_item(
        &self,
        item: ItemId,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<Stroke>, StrokeRepositoryError>;

    /// Remove the strokes of one item inside `window`, returning the count.
    async fn remove_for_item(
        &self,
        item: ItemId,
        window: Option<PeriodWindow>,
    ) -> Result<u64, StrokeRepositoryError>;

    /// Per-item stroke counts of one user inside `window`.
    async fn counts_for_user(
        &self,
        user: UserId,
        window: Option<PeriodWindow>,
    ) -> Result<Vec<(ItemId, u64)>, StrokeRepositoryError>;
}
