//! Invitation code gating self-registration.

use std::fmt;

/// Minimum invitation code length after trimming.
pub const INVITATION_CODE_MIN: usize = 3;

/// Error raised for codes that are too short once trimmed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invitation code must be at least {min} characters")]
pub struct InvitationCodeError {
    pub min: usize,
}

/// Shared secret a prospective user must present when registering.
#[derive(Clone, PartialEq, Eq)]
pub struct InvitationCode(String);

impl InvitationCode {
    /// Validate and trim a code chosen by an administrator.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvitationCodeError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() < INVITATION_CODE_MIN {
            return Err(InvitationCodeError {
                min: INVITATION_CODE_MIN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Wrap a code read back from storage without re-validating it.
    pub(crate) fn from_stored(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Exact comparison against a code presented at registration.
    #[must_use]
    pub fn matches(&self, presented: &str) -> bool {
        self.0 == presented
    }

    /// Stored code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for InvitationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InvitationCode(<redacted>)")
    }
}
