//! Port for issuing and verifying signed session tokens.

use chrono::{DateTime, Utc};

use crate::domain::{SessionClaims, SessionToken};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum SessionTokenError {
        /// The token could not be signed.
        Signing { message: String } => "session token signing failed: {message}",
        /// Signature, encoding or claims are not acceptable.
        Invalid { message: String } => "session token invalid: {message}",
        /// The token was valid but its lifetime has passed.
        Expired => "session token expired",
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait SessionTokens: Send + Sync {
    /// Sign `claims` into a bearer token.
    fn issue(&self, claims: &SessionClaims) -> Result<SessionToken, SessionTokenError>;

    /// Check the signature of `token` and that it has not expired at `now`.
    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionTokenError>;
}
