//! Driving port resolving bearer tokens into callers.
//!
//! Inbound adapters extract the token from the transport and ask this port
//! for the caller. Missing tokens never reach the port; adapters answer those
//! with `401` themselves.

use async_trait::async_trait;

use crate::domain::{Caller, Error};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Verify `token` and return the identity it asserts.
    ///
    /// Fails with `invalid_token` when the token is malformed, forged or
    /// expired.
    async fn authenticate(&self, token: &str) -> Result<Caller, Error>;

    /// Verify `token` and confirm against the store that the account still
    /// exists and holds the admin role.
    async fn require_admin(&self, token: &str) -> Result<Caller, Error>;
}
