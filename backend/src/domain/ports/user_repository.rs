//! Port abstraction for user account persistence.
//!
//! Operations that must check the admin count before mutating run inside a
//! single storage transaction in the adapter.

use async_trait::async_trait;

use crate::domain::{NewUser, PasswordDigest, Role, User, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// No account has the requested id.
        NotFound => "user not found",
        /// The username is already registered.
        DuplicateUsername => "username already exists",
        /// The email address is already registered.
        DuplicateEmail => "email already exists",
        /// The change would leave no administrator.
        LastAdmin => "at least one admin must remain",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch an account and its credential by exact username.
    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// Fetch an account and its credential by id.
    async fn find_account(&self, id: UserId) -> Result<Option<UserAccount>, UserRepositoryError>;

    /// Fetch an account by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError>;

    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<User>, UserRepositoryError>;

    /// Provision an account. Uniqueness races surface as duplicate errors.
    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    /// Replace the stored password digest.
    async fn update_password(
        &self,
        id: UserId,
        digest: &PasswordDigest,
    ) -> Result<(), UserRepositoryError>;

    /// Change an account's role, refusing to demote the last admin.
    async fn change_role(&self, id: UserId, role: Role) -> Result<User, UserRepositoryError>;

    /// Delete an account, refusing to remove the last admin.
    async fn delete(&self, id: UserId) -> Result<(), UserRepositoryError>;
}
