//! Driving port for logging consumption and reading it back.

use async_trait::async_trait;

use crate::domain::{
    Caller, Error, ItemAnalytics, ItemId, PeriodSelector, StrokeReceipt, UserStrokeSummary,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StrokeLedger: Send + Sync {
    /// Record one stroke by the caller against an item.
    async fn add_stroke(&self, caller: &Caller, item: ItemId) -> Result<StrokeReceipt, Error>;

    /// Per-user and recent stroke figures for one item.
    async fn item_analytics(
        &self,
        item: ItemId,
        period: PeriodSelector,
    ) -> Result<ItemAnalytics, Error>;

    /// Delete an item's strokes inside the period, returning how many went.
    async fn reset_strokes(&self, item: ItemId, period: PeriodSelector) -> Result<u64, Error>;

    /// The caller's own counts per item with the priced total.
    async fn user_summary(
        &self,
        caller: &Caller,
        period: PeriodSelector,
    ) -> Result<UserStrokeSummary, Error>;
}
