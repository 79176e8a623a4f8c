//! Stroke logging, per-item analytics and per-user consumption summaries.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{error, info};

use super::billing_service::resolve_window;
use super::ports::{BillingPeriodRepository, ItemRepository, StrokeLedger, StrokeRepository};
use super::repository_errors::{map_item_error, map_stroke_error};
use super::{
    Caller, Error, Item, ItemAnalytics, ItemId, NewStroke, PeriodSelector, StrokeReceipt,
    UserStrokeSummary,
};

/// Service implementing [`StrokeLedger`].
#[derive(Clone)]
pub struct LedgerService<S, I, B> {
    strokes: Arc<S>,
    items: Arc<I>,
    periods: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<S, I, B> LedgerService<S, I, B> {
    /// Create a service over the stroke, item and billing period stores.
    pub fn new(strokes: Arc<S>, items: Arc<I>, periods: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            strokes,
            items,
            periods,
            clock,
        }
    }
}

impl<S, I, B> LedgerService<S, I, B>
where
    I: ItemRepository,
{
    async fn existing_item(&self, id: ItemId) -> Result<Item, Error> {
        self.items
            .find_by_id(id)
            .await
            .map_err(map_item_error)?
            .ok_or_else(|| Error::not_found("item not found"))
    }
}

#[async_trait]
impl<S, I, B> StrokeLedger for LedgerService<S, I, B>
where
    S: StrokeRepository,
    I: ItemRepository,
    B: BillingPeriodRepository,
{
    async fn add_stroke(&self, caller: &Caller, item: ItemId) -> Result<StrokeReceipt, Error> {
        let target = self.existing_item(item).await?;
        let stroke = self
            .strokes
            .append(&NewStroke {
                item_id: item,
                user_id: caller.user_id,
                username: caller.username.clone(),
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_stroke_error)?;
        info!(item_id = %item, user_id = %caller.user_id, stroke_id = %stroke.id, "stroke added");
        Ok(StrokeReceipt {
            id: stroke.id,
            item_name: target.name,
            created_at: stroke.created_at,
        })
    }

    async fn item_analytics(
        &self,
        item: ItemId,
        period: PeriodSelector,
    ) -> Result<ItemAnalytics, Error> {
        let target = self.existing_item(item).await?;
        let window = resolve_window(self.periods.as_ref(), period).await?;
        let strokes = self
            .strokes
            .list_for_item(item, window)
            .await
            .map_err(map_stroke_error)?;
        Ok(ItemAnalytics::aggregate(&target, strokes))
    }

    async fn reset_strokes(&self, item: ItemId, period: PeriodSelector) -> Result<u64, Error> {
        self.existing_item(item).await?;
        let window = resolve_window(self.periods.as_ref(), period).await?;
        let removed = self
            .strokes
            .remove_for_item(item, window)
            .await
            .map_err(map_stroke_error)?;
        info!(item_id = %item, removed, scoped = window.is_some(), "strokes reset");
        Ok(removed)
    }

    async fn user_summary(
        &self,
        caller: &Caller,
        period: PeriodSelector,
    ) -> Result<UserStrokeSummary, Error> {
        let window = resolve_window(self.periods.as_ref(), period).await?;
        let counts = self
            .strokes
            .counts_for_user(caller.user_id, window)
            .await
            .map_err(map_stroke_error)?;
        let items = self.items.list(None).await.map_err(map_item_error)?;
        UserStrokeSummary::price(counts, &items).map_err(|err| {
            error!(user_id = %caller.user_id, error = %err, "stroke summary cost overflow");
            Error::internal(err.to_string())
        })
    }
}
