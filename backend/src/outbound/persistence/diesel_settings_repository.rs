//! PostgreSQL-backed `SettingsRepository` over the `settings` key/value table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::InvitationCode;
use crate::domain::ports::{SettingsRepository, SettingsRepositoryError};

use super::diesel_helpers::DbFailure;
use super::models::SettingRow;
use super::pool::DbPool;
use super::schema::settings;

/// Settings key holding the registration invitation code.
pub(crate) const INVITATION_CODE_KEY: &str = "invitation_code";

/// Diesel implementation of [`SettingsRepository`].
#[derive(Clone)]
pub struct DieselSettingsRepository {
    pool: DbPool,
}

impl DieselSettingsRepository {
    /// Create a repository over `pool`.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: impl Into<DbFailure>) -> SettingsRepositoryError {
    failure.into().into_port_error(
        SettingsRepositoryError::connection,
        SettingsRepositoryError::query,
    )
}

#[async_trait]
impl SettingsRepository for DieselSettingsRepository {
    async fn invitation_code(&self) -> Result<Option<InvitationCode>, SettingsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_failure)?;
        let value: Option<String> = settings::table
            .find(INVITATION_CODE_KEY)
            .select(settings::value)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_failure)?;
        Ok(value.map(InvitationCode::from_stored))
    }

    async fn set_invitation_code(
        &self,
        code: &InvitationCode,
    ) -> Result<(), SettingsRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_failure)?;
        diesel::insert_into(settings::table)
            .values(&SettingRow {
                key: INVITATION_CODE_KEY,
                value: code.as_str(),
            })
            .on_conflict(settings::key)
            .do_update()
            .set(settings::value.eq(excluded(settings::value)))
            .execute(&mut conn)
            .await
            .map_err(map_failure)?;
        Ok(())
    }
}
