//! Port for the key/value settings store.

use async_trait::async_trait;

use crate::domain::InvitationCode;

use super::define_port_error;

define_port_error! {
    /// Errors raised by settings repository adapters.
    pub enum SettingsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "settings repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "settings repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Current invitation code, read live on every call.
    async fn invitation_code(&self) -> Result<Option<InvitationCode>, SettingsRepositoryError>;

    /// Replace the invitation code.
    async fn set_invitation_code(&self, code: &InvitationCode)
    -> Result<(), SettingsRepositoryError>;
}
