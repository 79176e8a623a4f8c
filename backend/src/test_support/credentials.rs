//! Fast credential hasher for tests that do not exercise argon2.

use async_trait::async_trait;

use crate::domain::ports::{CredentialHasher, CredentialHasherError};
use crate::domain::{NewPassword, PasswordDigest};

const PREFIX: &str = "plain$";

/// Stores passwords behind a marker prefix instead of hashing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextHasher;

#[async_trait]
impl CredentialHasher for PlaintextHasher {
    async fn hash(&self, password: &NewPassword) -> Result<PasswordDigest, CredentialHasherError> {
        Ok(PasswordDigest::new(format!("{PREFIX}{}", password.expose())))
    }

    async fn verify(&self, candidate: &str, digest: &PasswordDigest) -> bool {
        digest
            .as_str()
            .strip_prefix(PREFIX)
            .is_some_and(|stored| stored == candidate)
    }
}
