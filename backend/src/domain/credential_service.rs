//! Login, session issuance and self-service password changes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeDelta;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use super::ports::{
    Authentication, CredentialHasher, LoginOutcome, SessionTokens, UserRepository,
};
use super::repository_errors::{map_hasher_error, map_token_error, map_user_error};
use super::{Caller, Error, LoginCredentials, NewPassword, SessionClaims, User};

/// Default session lifetime in hours.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Credential service implementing [`Authentication`].
#[derive(Clone)]
pub struct CredentialService<U, H, T> {
    users: Arc<U>,
    hasher: Arc<H>,
    tokens: Arc<T>,
    clock: Arc<dyn Clock>,
    token_ttl: TimeDelta,
}

impl<U, H, T> CredentialService<U, H, T> {
    /// Create a service issuing tokens valid for [`DEFAULT_TOKEN_TTL_HOURS`].
    pub fn new(users: Arc<U>, hasher: Arc<H>, tokens: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            tokens,
            clock,
            token_ttl: TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS),
        }
    }

    /// Override the session lifetime.
    #[must_use]
    pub fn with_token_ttl(mut self, token_ttl: TimeDelta) -> Self {
        self.token_ttl = token_ttl;
        self
    }
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

#[async_trait]
impl<U, H, T> Authentication for CredentialService<U, H, T>
where
    U: UserRepository,
    H: CredentialHasher,
    T: SessionTokens,
{
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome, Error> {
        let account = self
            .users
            .find_account_by_username(credentials.username())
            .await
            .map_err(map_user_error)?
            .ok_or_else(invalid_credentials)?;
        if !self
            .hasher
            .verify(credentials.password(), &account.password_digest)
            .await
        {
            return Err(invalid_credentials());
        }

        let issued_at = self.clock.utc();
        let expires_at = issued_at + self.token_ttl;
        let user = account.user;
        let claims = SessionClaims {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            issued_at,
            expires_at,
        };
        let token = self.tokens.issue(&claims).map_err(map_token_error)?;
        info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(LoginOutcome {
            token,
            user,
            expires_at,
        })
    }

    async fn current_user(&self, caller: &Caller) -> Result<User, Error> {
        self.users
            .find_by_id(caller.user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn change_password(
        &self,
        caller: &Caller,
        current: &str,
        replacement: &NewPassword,
    ) -> Result<(), Error> {
        let account = self
            .users
            .find_account(caller.user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;
        if !self.hasher.verify(current, &account.password_digest).await {
            return Err(Error::invalid_request("current password is incorrect")
                .with_details(json!({ "field": "currentPassword", "code": "wrong_password" })));
        }
        let digest = self
            .hasher
            .hash(replacement)
            .await
            .map_err(map_hasher_error)?;
        self.users
            .update_password(caller.user_id, &digest)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %caller.user_id, "password changed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "credential_service_tests.rs"]
mod tests;
