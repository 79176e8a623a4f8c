//! Port for one-way password hashing.
//!
//! Hashing is CPU-bound; adapters must keep it off the async worker threads.

use async_trait::async_trait;

use crate::domain::{NewPassword, PasswordDigest};

use super::define_port_error;

define_port_error! {
    /// Errors raised by hashing adapters.
    pub enum CredentialHasherError {
        /// The adapter could not produce a digest.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Produce a salted, self-describing digest for `password`.
    async fn hash(&self, password: &NewPassword) -> Result<PasswordDigest, CredentialHasherError>;

    /// Whether `candidate` matches `digest`. Unparseable digests never match.
    async fn verify(&self, candidate: &str, digest: &PasswordDigest) -> bool;
}
