//! Administrator account management and invitation code upkeep.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::ports::{CredentialHasher, SettingsRepository, UserAdministration, UserRepository};
use super::repository_errors::{map_hasher_error, map_settings_error, map_user_error};
use super::{
    BOOTSTRAP_ADMIN_ID, Caller, Error, InvitationCode, NewPassword, Role, User, UserId,
};

/// Service implementing [`UserAdministration`].
#[derive(Clone)]
pub struct UserAdminService<U, S, H> {
    users: Arc<U>,
    settings: Arc<S>,
    hasher: Arc<H>,
}

impl<U, S, H> UserAdminService<U, S, H> {
    /// Create a service over the given ports.
    pub fn new(users: Arc<U>, settings: Arc<S>, hasher: Arc<H>) -> Self {
        Self {
            users,
            settings,
            hasher,
        }
    }
}

#[async_trait]
impl<U, S, H> UserAdministration for UserAdminService<U, S, H>
where
    U: UserRepository,
    S: SettingsRepository,
    H: CredentialHasher,
{
    async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.users.list().await.map_err(map_user_error)
    }

    async fn delete_user(&self, caller: &Caller, id: UserId) -> Result<(), Error> {
        if id == BOOTSTRAP_ADMIN_ID {
            return Err(Error::forbidden("the bootstrap admin cannot be deleted")
                .with_details(json!({ "code": "protected_user" })));
        }
        self.users.delete(id).await.map_err(map_user_error)?;
        info!(user_id = %id, deleted_by = %caller.user_id, "account deleted");
        Ok(())
    }

    async fn reset_password(&self, id: UserId, password: &NewPassword) -> Result<(), Error> {
        let digest = self
            .hasher
            .hash(password)
            .await
            .map_err(map_hasher_error)?;
        self.users
            .update_password(id, &digest)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %id, "password reset by admin");
        Ok(())
    }

    async fn change_role(&self, id: UserId, role: Role) -> Result<User, Error> {
        let user = self
            .users
            .change_role(id, role)
            .await
            .map_err(map_user_error)?;
        info!(user_id = %id, %role, "role changed");
        Ok(user)
    }

    async fn invitation_code(&self) -> Result<InvitationCode, Error> {
        self.settings
            .invitation_code()
            .await
            .map_err(map_settings_error)?
            .ok_or_else(|| Error::not_found("no invitation code is configured"))
    }

    async fn set_invitation_code(&self, code: &InvitationCode) -> Result<(), Error> {
        self.settings
            .set_invitation_code(code)
            .await
            .map_err(map_settings_error)?;
        info!("invitation code updated");
        Ok(())
    }
}
