//! PostgreSQL-backed `BootstrapRepository`.
//!
//! Both operations write explicit ids, so each ends by moving the affected
//! `BIGSERIAL` sequences past the highest stored id.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{BootstrapRepository, BootstrapRepositoryError};
use crate::domain::{
    BOOTSTRAP_ADMIN_ID, DEFAULT_ROOM_ID, DefaultSeed, ImportOutcome, LegacyImport, SeedReport,
    SeedStatus,
};

use super::diesel_helpers::DbFailure;
use super::diesel_settings_repository::INVITATION_CODE_KEY;
use super::models::{NewItemRow, NewRoomRow, NewStrokeRow, SettingRow, UserWithIdRow};
use super::pool::DbPool;
use super::schema::{items, rooms, settings, strokes, users};

/// Rows per multi-row `INSERT`; keeps bind parameters well under the
/// PostgreSQL limit.
const INSERT_CHUNK: usize = 500;

/// Tables whose ids may be written explicitly.
const SEQUENCED_TABLES: [&str; 4] = ["users", "rooms", "items", "strokes"];

/// Diesel implementation of [`BootstrapRepository`].
#[derive(Clone)]
pub struct DieselBootstrapRepository {
    pool: DbPool,
}

impl DieselBootstrapRepository {
    /// Create a repository over `pool`.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: DbFailure) -> BootstrapRepositoryError {
    failure.into_port_error(
        BootstrapRepositoryError::connection,
        BootstrapRepositoryError::query,
    )
}

fn map_diesel(error: diesel::result::Error) -> BootstrapRepositoryError {
    map_failure(error.into())
}

fn resync_sequence_sql(table: &str) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
    )
}

async fn resync_sequences(
    conn: &mut AsyncPgConnection,
    tables: &[&str],
) -> Result<(), diesel::result::Error> {
    for table in tables {
        diesel::sql_query(resync_sequence_sql(table))
            .execute(conn)
            .await?;
    }
    Ok(())
}

async fn has_accounts(conn: &mut AsyncPgConnection) -> Result<bool, diesel::result::Error> {
    diesel::select(diesel::dsl::exists(users::table.select(users::id)))
        .get_result(conn)
        .await
}

async fn write_import(
    conn: &mut AsyncPgConnection,
    import: &LegacyImport,
) -> Result<(), diesel::result::Error> {
    let user_rows: Vec<UserWithIdRow<'_>> = import
        .users
        .iter()
        .map(|account| UserWithIdRow {
            id: account.user.id.get(),
            username: account.user.username.as_ref(),
            email: account.user.email.as_ref().map(AsRef::as_ref),
            password_digest: account.password_digest.as_str(),
            role: account.user.role.as_str(),
            created_at: account.user.created_at,
        })
        .collect();
    for chunk in user_rows.chunks(INSERT_CHUNK) {
        diesel::insert_into(users::table)
            .values(chunk)
            .execute(conn)
            .await?;
    }

    let room_rows: Vec<NewRoomRow<'_>> = import
        .rooms
        .iter()
        .map(|room| NewRoomRow {
            id: Some(room.id.get()),
            name: room.name.as_ref(),
            description: room.description.as_ref(),
            created_at: room.created_at,
            created_by: room.created_by.map(|id| id.get()),
        })
        .collect();
    for chunk in room_rows.chunks(INSERT_CHUNK) {
        diesel::insert_into(rooms::table)
            .values(chunk)
            .execute(conn)
            .await?;
    }

    let item_rows: Vec<NewItemRow<'_>> = import
        .items
        .iter()
        .map(|item| NewItemRow {
            id: Some(item.id.get()),
            name: item.name.as_ref(),
            description: item.description.as_ref(),
            room_id: item.room_id.get(),
            room_name: item.room_name.as_ref(),
            price_cents: item.price.cents(),
            created_at: item.created_at,
            created_by: item.created_by.map(|id| id.get()),
        })
        .collect();
    for chunk in item_rows.chunks(INSERT_CHUNK) {
        diesel::insert_into(items::table)
            .values(chunk)
            .execute(conn)
            .await?;
    }

    let stroke_rows: Vec<NewStrokeRow<'_>> = import
        .strokes
        .iter()
        .map(|stroke| NewStrokeRow {
            id: Some(stroke.id.get()),
            item_id: stroke.item_id.get(),
            user_id: stroke.user_id.map(|id| id.get()),
            username: stroke.username.as_ref(),
            created_at: stroke.created_at,
        })
        .collect();
    for chunk in stroke_rows.chunks(INSERT_CHUNK) {
        diesel::insert_into(strokes::table)
            .values(chunk)
            .execute(conn)
            .await?;
    }

    if let Some(code) = &import.invitation_code {
        diesel::insert_into(settings::table)
            .values(&SettingRow {
                key: INVITATION_CODE_KEY,
                value: code.as_str(),
            })
            .on_conflict(settings::key)
            .do_update()
            .set(settings::value.eq(code.as_str()))
            .execute(conn)
            .await?;
    }

    resync_sequences(conn, &SEQUENCED_TABLES).await
}

const fn status(written: usize) -> SeedStatus {
    if written == 0 {
        SeedStatus::AlreadyPresent
    } else {
        SeedStatus::Created
    }
}

async fn write_seed(
    conn: &mut AsyncPgConnection,
    seed: &DefaultSeed,
) -> Result<SeedReport, diesel::result::Error> {
    let admin = match (&seed.admin, has_accounts(conn).await?) {
        (_, true) => SeedStatus::AlreadyPresent,
        (None, false) => SeedStatus::Missing,
        (Some(admin), false) => {
            diesel::insert_into(users::table)
                .values(&UserWithIdRow {
                    id: BOOTSTRAP_ADMIN_ID.get(),
                    username: admin.username.as_ref(),
                    email: admin.email.as_ref().map(AsRef::as_ref),
                    password_digest: admin.password_digest.as_str(),
                    role: admin.role.as_str(),
                    created_at: admin.created_at,
                })
                .execute(conn)
                .await?;
            SeedStatus::Created
        }
    };

    // Only the id decides presence; a name held by another room is an error.
    let room = diesel::insert_into(rooms::table)
        .values(&NewRoomRow {
            id: Some(DEFAULT_ROOM_ID.get()),
            name: seed.room.name.as_ref(),
            description: seed.room.description.as_ref(),
            created_at: seed.room.created_at,
            created_by: seed.room.created_by.map(|id| id.get()),
        })
        .on_conflict(rooms::id)
        .do_nothing()
        .execute(conn)
        .await?;

    let invitation_code = diesel::insert_into(settings::table)
        .values(&SettingRow {
            key: INVITATION_CODE_KEY,
            value: seed.invitation_code.as_str(),
        })
        .on_conflict(settings::key)
        .do_nothing()
        .execute(conn)
        .await?;

    resync_sequences(conn, &["users", "rooms"]).await?;

    Ok(SeedReport {
        admin,
        room: status(room),
        invitation_code: status(invitation_code),
    })
}

#[async_trait]
impl BootstrapRepository for DieselBootstrapRepository {
    async fn import_legacy(
        &self,
        import: &LegacyImport,
    ) -> Result<ImportOutcome, BootstrapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        let imported = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    if has_accounts(conn).await? {
                        return Ok(false);
                    }
                    write_import(conn, import).await?;
                    Ok(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;
        if !imported {
            debug!("accounts present; legacy snapshot not written");
            return Ok(ImportOutcome::SkippedExistingData);
        }
        Ok(ImportOutcome::Imported {
            users: import.users.len(),
            rooms: import.rooms.len(),
            items: import.items.len(),
            strokes: import.strokes.len(),
        })
    }

    async fn seed_defaults(
        &self,
        seed: &DefaultSeed,
    ) -> Result<SeedReport, BootstrapRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|e| map_failure(e.into()))?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move { write_seed(conn, seed).await }.scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn sequence_resync_targets_the_next_free_id() {
        let sql = resync_sequence_sql("rooms");
        assert!(sql.contains("pg_get_serial_sequence('rooms', 'id')"));
        assert!(sql.contains("MAX(id) FROM rooms"));
        assert!(sql.ends_with("+ 1, false)"));
    }

    #[rstest]
    #[case(0, SeedStatus::AlreadyPresent)]
    #[case(1, SeedStatus::Created)]
    fn affected_rows_decide_seed_status(#[case] written: usize, #[case] expected: SeedStatus) {
        assert_eq!(status(written), expected);
    }

    #[rstest]
    fn constraint_failures_become_query_errors() {
        let failure = DbFailure::Unique {
            constraint: Some("rooms_name_key".to_owned()),
        };
        assert!(matches!(
            map_failure(failure),
            BootstrapRepositoryError::Query { .. }
        ));
    }
}
