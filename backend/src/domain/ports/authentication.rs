//! Driving port for login and self-service credential use-cases.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Caller, Error, LoginCredentials, NewPassword, SessionToken, User};

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub token: SessionToken,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Authentication: Send + Sync {
    /// Check credentials and issue a session token.
    ///
    /// Unknown usernames and wrong passwords fail identically.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error>;

    /// Account of the caller as currently stored.
    async fn current_user(&self, caller: &Caller) -> Result<User, Error>;

    /// Replace the caller's password after confirming the current one.
    async fn change_password(
        &self,
        caller: &Caller,
        current: &str,
        replacement: &NewPassword,
    ) -> Result<(), Error>;
}
