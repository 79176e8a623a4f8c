//! Authentication primitives: credentials, passwords, session claims and
//! caller identity.
//!
//! Inbound adapters build these values from raw strings before a handler
//! talks to a port or service.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::ids::UserId;
use super::user::{Role, Username};

/// Minimum length of a newly chosen password, in characters.
pub const PASSWORD_MIN: usize = 6;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials used by authentication services.
///
/// The username is trimmed; the password keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use fixtrack::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin ", "password").unwrap();
/// assert_eq!(creds.username(), "admin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    #[must_use]
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Error raised when a new password does not meet the policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordPolicyError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
}

/// A candidate password that satisfies the length policy.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPassword(Zeroizing<String>);

impl NewPassword {
    /// Validate a candidate password.
    pub fn new(raw: &str) -> Result<Self, PasswordPolicyError> {
        if raw.chars().count() < PASSWORD_MIN {
            return Err(PasswordPolicyError::TooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Plain-text password, for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for NewPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewPassword(<redacted>)")
    }
}

/// Opaque salted password digest in PHC string form.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Wrap a stored digest.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded digest as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// Identity and role asserted by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub username: Username,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signed bearer token handed to clients after login.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap an encoded token.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Role requirement attached to an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// No identity needed.
    Public,
    /// Any valid session.
    AnyAuthenticated,
    /// A valid session whose account currently holds the admin role.
    AdminOnly,
}

/// Resolved identity of the caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub username: Username,
    pub role: Role,
}

impl Caller {
    /// Whether the caller holds the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<SessionClaims> for Caller {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
            role: claims.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("user", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn credentials_keep_password_whitespace() {
        let creds = LoginCredentials::try_from_parts("alice", " secret ").expect("valid");
        assert_eq!(creds.password(), " secret ");
    }

    #[rstest]
    #[case("12345", false)]
    #[case("123456", true)]
    #[case("äöüäöü", true)]
    fn new_password_enforces_minimum_length(#[case] raw: &str, #[case] accepted: bool) {
        assert_eq!(NewPassword::new(raw).is_ok(), accepted);
    }

    #[rstest]
    fn secrets_are_redacted_in_debug_output() {
        let password = NewPassword::new("hunter22").expect("valid password");
        let digest = PasswordDigest::new("$argon2id$v=19$secret");
        assert!(!format!("{password:?}").contains("hunter22"));
        assert!(!format!("{digest:?}").contains("secret"));
    }
}
