//! Argon2id password hashing.
//!
//! New digests are argon2id PHC strings. Digests imported from legacy
//! snapshots are bcrypt (`$2a$`, `$2b$`, `$2y$`) and are accepted for
//! verification only. Both key derivations run on the blocking thread pool.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use async_trait::async_trait;
use tokio::task;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::domain::ports::{CredentialHasher, CredentialHasherError};
use crate::domain::{NewPassword, PasswordDigest};

const BCRYPT_PREFIXES: [&str; 3] = ["$2a$", "$2b$", "$2y$"];

/// [`CredentialHasher`] backed by argon2id with default parameters.
#[derive(Clone, Default)]
pub struct Argon2Hasher {
    argon: Argon2<'static>,
}

impl Argon2Hasher {
    /// Hasher using the crate's recommended argon2id parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_bcrypt(digest: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|prefix| digest.starts_with(prefix))
}

fn hash_blocking(argon: &Argon2<'_>, password: &str) -> Result<PasswordDigest, CredentialHasherError> {
    let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>())
        .map_err(|err| CredentialHasherError::hashing(err.to_string()))?;
    let hash = argon
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| CredentialHasherError::hashing(err.to_string()))?;
    Ok(PasswordDigest::new(hash.to_string()))
}

fn verify_blocking(argon: &Argon2<'_>, candidate: &str, stored: &str) -> bool {
    if is_bcrypt(stored) {
        return bcrypt::verify(candidate, stored).unwrap_or_else(|err| {
            debug!(error = %err, "unreadable bcrypt digest");
            false
        });
    }
    match PasswordHash::new(stored) {
        Ok(parsed) => argon.verify_password(candidate.as_bytes(), &parsed).is_ok(),
        Err(err) => {
            debug!(error = %err, "unreadable password digest");
            false
        }
    }
}

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, password: &NewPassword) -> Result<PasswordDigest, CredentialHasherError> {
        let argon = self.argon.clone();
        let secret = Zeroizing::new(password.expose().to_owned());
        task::spawn_blocking(move || hash_blocking(&argon, &secret))
            .await
            .map_err(|err| CredentialHasherError::hashing(format!("hashing task failed: {err}")))?
    }

    async fn verify(&self, candidate: &str, digest: &PasswordDigest) -> bool {
        let argon = self.argon.clone();
        let candidate = Zeroizing::new(candidate.to_owned());
        let stored = digest.as_str().to_owned();
        task::spawn_blocking(move || verify_blocking(&argon, &candidate, &stored))
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, "password verification task failed");
                false
            })
    }
}
