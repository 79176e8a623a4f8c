//! Invitation-gated self-registration.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use super::ports::{
    CredentialHasher, Registration, RegistrationRequest, SettingsRepository, UserRepository,
};
use super::repository_errors::{map_hasher_error, map_settings_error, map_user_error};
use super::{Error, NewUser, Role, User};

/// Registration service implementing [`Registration`].
#[derive(Clone)]
pub struct RegistrationService<U, S, H> {
    users: Arc<U>,
    settings: Arc<S>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
    require_email: bool,
}

impl<U, S, H> RegistrationService<U, S, H> {
    /// Create a service where email is optional.
    pub fn new(users: Arc<U>, settings: Arc<S>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            settings,
            hasher,
            clock,
            require_email: false,
        }
    }

    /// Make an email address mandatory for new accounts.
    #[must_use]
    pub fn with_required_email(mut self, require_email: bool) -> Self {
        self.require_email = require_email;
        self
    }
}

fn invalid_invitation() -> Error {
    Error::invalid_request("invalid invitation code")
        .with_details(json!({ "field": "invitationCode", "code": "invalid_invitation_code" }))
}

#[async_trait]
impl<U, S, H> Registration for RegistrationService<U, S, H>
where
    U: UserRepository,
    S: SettingsRepository,
    H: CredentialHasher,
{
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error> {
        if self.require_email && request.email.is_none() {
            return Err(Error::invalid_request("email is required")
                .with_details(json!({ "field": "email", "code": "missing_field" })));
        }

        // Read on every call so a rotated code takes effect immediately.
        let stored = self
            .settings
            .invitation_code()
            .await
            .map_err(map_settings_error)?;
        match stored {
            Some(code) if code.matches(&request.invitation_code) => {}
            _ => return Err(invalid_invitation()),
        }

        let password_digest = self
            .hasher
            .hash(&request.password)
            .await
            .map_err(map_hasher_error)?;
        let user = self
            .users
            .insert(&NewUser {
                username: request.username,
                email: request.email,
                role: Role::User,
                password_digest,
                created_at: self.clock.utc(),
            })
            .await
            .map_err(map_user_error)?;
        info!(user_id = %user.id, username = %user.username, "account registered");
        Ok(user)
    }
}
