//! Driving port for invitation-gated self-registration.

use async_trait::async_trait;

use crate::domain::{EmailAddress, Error, NewPassword, User, Username};

/// Validated registration form.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub username: Username,
    pub password: NewPassword,
    pub email: Option<EmailAddress>,
    /// Compared verbatim with the stored code.
    pub invitation_code: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Registration: Send + Sync {
    /// Create a regular account when the invitation code matches.
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error>;
}
