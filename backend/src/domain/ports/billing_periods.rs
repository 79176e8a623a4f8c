//! Driving port for billing period administration and lookup.

use async_trait::async_trait;

use crate::domain::{BillingPeriod, BillingPeriodId, Caller, DateRange, Error, PeriodName};

/// Validated billing period creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPeriodDraft {
    pub name: PeriodName,
    pub range: DateRange,
    /// Activate in the same transaction as creation.
    pub activate: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingPeriods: Send + Sync {
    /// Create a period, inactive unless the draft asks otherwise.
    async fn create(
        &self,
        caller: &Caller,
        draft: BillingPeriodDraft,
    ) -> Result<BillingPeriod, Error>;

    /// Make `id` the only active period.
    async fn activate(&self, id: BillingPeriodId) -> Result<BillingPeriod, Error>;

    /// Every period, newest first.
    async fn list(&self) -> Result<Vec<BillingPeriod>, Error>;

    /// The active period, if any.
    async fn active(&self) -> Result<Option<BillingPeriod>, Error>;
}
