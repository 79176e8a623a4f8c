//! Access control: turning bearer tokens into callers and enforcing roles.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use super::ports::{AccessControl, SessionTokens, UserRepository};
use super::repository_errors::{map_token_error, map_user_error};
use super::{Caller, Capability, Error};

/// Token-backed implementation of [`AccessControl`].
#[derive(Clone)]
pub struct AccessService<U, T> {
    users: Arc<U>,
    tokens: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<U, T> AccessService<U, T> {
    /// Create a service verifying tokens with `tokens` and re-reading roles
    /// from `users`.
    pub fn new(users: Arc<U>, tokens: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            tokens,
            clock,
        }
    }
}

#[async_trait]
impl<U, T> AccessControl for AccessService<U, T>
where
    U: UserRepository,
    T: SessionTokens,
{
    async fn authenticate(&self, token: &str) -> Result<Caller, Error> {
        self.tokens
            .verify(token, self.clock.utc())
            .map(Caller::from)
            .map_err(|error| {
                debug!(%error, "session token rejected");
                map_token_error(error)
            })
    }

    async fn require_admin(&self, token: &str) -> Result<Caller, Error> {
        let caller = self.authenticate(token).await?;
        let stored = self
            .users
            .find_by_id(caller.user_id)
            .await
            .map_err(map_user_error)?;
        match stored {
            Some(user) if user.role.is_admin() => Ok(Caller {
                user_id: user.id,
                username: user.username,
                role: user.role,
            }),
            _ => Err(Error::forbidden("admin role required")),
        }
    }
}

/// Resolve the caller of an operation guarded by `capability`.
///
/// Public operations ignore the token entirely. Protected operations without
/// a token fail with `unauthorized`.
pub async fn resolve_caller(
    access: &dyn AccessControl,
    token: Option<&str>,
    capability: Capability,
) -> Result<Option<Caller>, Error> {
    let token = match (capability, token) {
        (Capability::Public, _) => return Ok(None),
        (_, None) => return Err(Error::unauthorized("authentication required")),
        (_, Some(token)) => token,
    };
    let caller = match capability {
        Capability::AdminOnly => access.require_admin(token).await?,
        _ => access.authenticate(token).await?,
    };
    Ok(Some(caller))
}
