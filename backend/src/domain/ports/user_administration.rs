//! Driving port for administrator account management.

use async_trait::async_trait;

use crate::domain::{Caller, Error, InvitationCode, NewPassword, Role, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAdministration: Send + Sync {
    /// Every account, newest first.
    async fn list_users(&self) -> Result<Vec<User>, Error>;

    /// Delete an account. The bootstrap admin and the last admin are kept.
    async fn delete_user(&self, caller: &Caller, id: UserId) -> Result<(), Error>;

    /// Overwrite another account's password.
    async fn reset_password(&self, id: UserId, password: &NewPassword) -> Result<(), Error>;

    /// Change an account's role. Demoting the last admin is refused.
    async fn change_role(&self, id: UserId, role: Role) -> Result<User, Error>;

    /// Current invitation code.
    async fn invitation_code(&self) -> Result<InvitationCode, Error>;

    /// Replace the invitation code.
    async fn set_invitation_code(&self, code: &InvitationCode) -> Result<(), Error>;
}
