//! PostgreSQL-backed `UserRepository`.
//!
//! Role changes and deletions lock every admin row before counting, so two
//! concurrent demotions cannot both pass the last-admin check.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{NewUser, PasswordDigest, Role, User, UserAccount, UserId};

use super::diesel_helpers::{DbFailure, TxError};
use super::models::{NewUserRow, UserRow, convert_all};
use super::pool::DbPool;
use super::schema::users;

const USERNAME_KEY: &str = "users_username_key";
const EMAIL_KEY: &str = "users_email_key";

/// Diesel implementation of [`UserRepository`].
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository over `pool`.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: DbFailure) -> UserRepositoryError {
    if failure.is_unique_on(USERNAME_KEY) {
        return UserRepositoryError::duplicate_username();
    }
    if failure.is_unique_on(EMAIL_KEY) {
        return UserRepositoryError::duplicate_email();
    }
    failure.into_port_error(
        UserRepositoryError::connection,
        UserRepositoryError::query,
    )
}

fn map_diesel(error: diesel::result::Error) -> UserRepositoryError {
    map_failure(DbFailure::from(error))
}

/// Lock every admin row and return their ids along with the target row.
async fn lock_admins_and_target(
    conn: &mut AsyncPgConnection,
    id: UserId,
) -> Result<(Vec<i64>, Option<UserRow>), diesel::result::Error> {
    let admins: Vec<i64> = users::table
        .filter(users::role.eq(Role::Admin.as_str()))
        .select(users::id)
        .for_update()
        .load(conn)
        .await?;
    let target = users::table
        .find(id.get())
        .select(UserRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    Ok((admins, target))
}

fn leaves_no_admin(target: &UserRow, admins: &[i64], new_role: Option<Role>) -> bool {
    let is_admin = target.role == Role::Admin.as_str();
    let stays_admin = new_role.is_some_and(Role::is_admin);
    is_admin && !stays_admin && admins.len() <= 1
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(UserRow::into_account)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn find_account(&self, id: UserId) -> Result<Option<UserAccount>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;
        row.map(UserRow::into_account)
            .transpose()
            .map_err(UserRepositoryError::query)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        self.find_account(id)
            .await
            .map(|account| account.map(|found| found.user))
    }

    async fn list(&self) -> Result<Vec<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order_by((users::created_at.desc(), users::id.desc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        convert_all(rows, UserRow::into_user).map_err(UserRepositoryError::query)
    }

    async fn insert(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = NewUserRow {
            username: user.username.as_ref(),
            email: user.email.as_ref().map(AsRef::as_ref),
            password_digest: user.password_digest.as_str(),
            role: user.role.as_str(),
            created_at: user.created_at,
        };
        let inserted: UserRow = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;
        inserted.into_user().map_err(UserRepositoryError::query)
    }

    async fn update_password(
        &self,
        id: UserId,
        digest: &PasswordDigest,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let updated = diesel::update(users::table.find(id.get()))
            .set(users::password_digest.eq(digest.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel)?;
        if updated == 0 {
            return Err(UserRepositoryError::not_found());
        }
        Ok(())
    }

    async fn change_role(&self, id: UserId, role: Role) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let row = conn
            .transaction::<_, TxError<UserRepositoryError>, _>(|conn| {
                async move {
                    let (admins, target) = lock_admins_and_target(conn, id).await?;
                    let target = target.ok_or_else(|| TxError::Refused(UserRepositoryError::not_found()))?;
                    if leaves_no_admin(&target, &admins, Some(role)) {
                        return Err(TxError::Refused(UserRepositoryError::last_admin()));
                    }
                    let updated: UserRow = diesel::update(users::table.find(id.get()))
                        .set(users::role.eq(role.as_str()))
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(updated)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| error.resolve(map_failure))?;
        row.into_user().map_err(UserRepositoryError::query)
    }

    async fn delete(&self, id: UserId) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        conn.transaction::<_, TxError<UserRepositoryError>, _>(|conn| {
            async move {
                let (admins, target) = lock_admins_and_target(conn, id).await?;
                let target = target.ok_or_else(|| TxError::Refused(UserRepositoryError::not_found()))?;
                if leaves_no_admin(&target, &admins, None) {
                    return Err(TxError::Refused(UserRepositoryError::last_admin()));
                }
                diesel::delete(users::table.find(id.get()))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| error.resolve(map_failure))
    }
}
