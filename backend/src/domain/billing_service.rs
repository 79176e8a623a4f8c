//! Billing period administration and the period-to-window lookup shared by
//! read operations.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use super::ports::{BillingPeriodDraft, BillingPeriodRepository, BillingPeriods};
use super::repository_errors::map_billing_period_error;
use super::{
    BillingPeriod, BillingPeriodId, Caller, Error, NewBillingPeriod, PeriodSelector, PeriodWindow,
};

/// Resolve a selector into an instant window.
///
/// `All` and ids without a stored period both mean "no filter".
pub(crate) async fn resolve_window<B>(
    periods: &B,
    selector: PeriodSelector,
) -> Result<Option<PeriodWindow>, Error>
where
    B: BillingPeriodRepository + ?Sized,
{
    let PeriodSelector::Period(id) = selector else {
        return Ok(None);
    };
    let period = periods
        .find_by_id(id)
        .await
        .map_err(map_billing_period_error)?;
    if period.is_none() {
        debug!(billing_period_id = %id, "unknown billing period; not filtering");
    }
    Ok(period.map(|period| period.range.window()))
}

/// Service implementing [`BillingPeriods`].
#[derive(Clone)]
pub struct BillingService<B> {
    periods: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<B> BillingService<B> {
    /// Create a service over the billing period repository.
    pub fn new(periods: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self { periods, clock }
    }
}

#[async_trait]
impl<B> BillingPeriods for BillingService<B>
where
    B: BillingPeriodRepository,
{
    async fn create(
        &self,
        caller: &Caller,
        draft: BillingPeriodDraft,
    ) -> Result<BillingPeriod, Error> {
        let new_period = NewBillingPeriod {
            name: draft.name,
            range: draft.range,
            created_by: Some(caller.user_id),
            created_at: self.clock.utc(),
        };
        let period = self
            .periods
            .create(&new_period, draft.activate)
            .await
            .map_err(map_billing_period_error)?;
        info!(
            billing_period_id = %period.id,
            active = period.is_active,
            "billing period created"
        );
        Ok(period)
    }

    async fn activate(&self, id: BillingPeriodId) -> Result<BillingPeriod, Error> {
        let period = self
            .periods
            .activate(id)
            .await
            .map_err(map_billing_period_error)?;
        info!(billing_period_id = %id, "billing period activated");
        Ok(period)
    }

    async fn list(&self) -> Result<Vec<BillingPeriod>, Error> {
        self.periods.list().await.map_err(map_billing_period_error)
    }

    async fn active(&self) -> Result<Option<BillingPeriod>, Error> {
        self.periods
            .find_active()
            .await
            .map_err(map_billing_period_error)
    }
}
