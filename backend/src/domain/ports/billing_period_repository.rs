//! Port for billing period persistence.

use async_trait::async_trait;

use crate::domain::{BillingPeriod, BillingPeriodId, NewBillingPeriod};

use super::define_port_error;

define_port_error! {
    /// Errors raised by billing period repository adapters.
    pub enum BillingPeriodRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "billing period repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "billing period repository query failed: {message}",
        /// No period has the requested id.
        NotFound => "billing period not found",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingPeriodRepository: Send + Sync {
    /// Create a period. With `activate` the new period becomes the only
    /// active one in the same transaction.
    async fn create(
        &self,
        period: &NewBillingPeriod,
        activate: bool,
    ) -> Result<BillingPeriod, BillingPeriodRepositoryError>;

    /// Make `id` the only active period, atomically.
    async fn activate(
        &self,
        id: BillingPeriodId,
    ) -> Result<BillingPeriod, BillingPeriodRepositoryError>;

    /// All periods, newest first.
    async fn list(&self) -> Result<Vec<BillingPeriod>, BillingPeriodRepositoryError>;

    /// Fetch a period by id.
    async fn find_by_id(
        &self,
        id: BillingPeriodId,
    ) -> Result<Option<BillingPeriod>, BillingPeriodRepositoryError>;

    /// The active period, if any.
    async fn find_active(&self) -> Result<Option<BillingPeriod>, BillingPeriodRepositoryError>;
}
