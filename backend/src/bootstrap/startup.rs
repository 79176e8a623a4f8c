//! Startup orchestration: schema migrations, the one-off legacy import and
//! default seeding.

use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use rand::Rng as _;
use rand::distributions::Alphanumeric;
use thiserror::Error;
use tracing::{info, warn};

use crate::bootstrap::config::{AppConfig, ConfigError};
use crate::domain::ports::{BootstrapRepository, CredentialHasher};
use crate::domain::{
    BootstrapService, EmailAddress, ImportOutcome, InvitationCode, NewPassword, RoomName,
    SeedDefaults, SeedReport, Username,
};
use crate::outbound::credentials::JwtSessionTokens;
use crate::outbound::persistence::{DbPool, MigrationError, PoolConfig, PoolError, run_migrations};

const GENERATED_INVITATION_CODE_LEN: usize = 12;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    /// A configuration value is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A seed value failed domain validation.
    #[error("invalid {setting}: {message}")]
    InvalidSetting {
        /// Name of the offending setting.
        setting: &'static str,
        /// Validation failure.
        message: String,
    },
    /// Schema migrations could not be applied.
    #[error(transparent)]
    Migration(#[from] MigrationError),
    /// The connection pool could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The legacy snapshot exists but could not be read.
    #[error("failed to read legacy snapshot at {path}: {source}")]
    LegacyRead {
        /// Path to the snapshot.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Import or seeding was rejected by the store.
    #[error("startup data task failed: {0}")]
    Bootstrap(#[from] crate::domain::Error),
}

impl From<StartupError> for std::io::Error {
    fn from(value: StartupError) -> Self {
        Self::other(value)
    }
}

/// What the startup data tasks did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    /// Legacy import result; `None` when no snapshot was configured or found.
    pub import: Option<ImportOutcome>,
    /// Default seeding result.
    pub seed: SeedReport,
}

fn invalid_setting(setting: &'static str, err: impl ToString) -> StartupError {
    StartupError::InvalidSetting {
        setting,
        message: err.to_string(),
    }
}

/// Apply pending migrations and open the connection pool.
///
/// # Errors
/// Fails when the database URL is missing, migrations fail or the pool
/// cannot be built.
pub async fn prepare_database(config: &AppConfig) -> Result<DbPool, StartupError> {
    let database_url = config.database_url()?;
    run_migrations(database_url).await?;
    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(config.pool_max_size()),
    )
    .await?;
    Ok(pool)
}

/// Session token adapter for the configured secret.
///
/// Without a secret, a random one is used when ephemeral secrets are allowed.
///
/// # Errors
/// [`ConfigError::MissingJwtSecret`] when neither is possible.
pub fn session_tokens(config: &AppConfig) -> Result<JwtSessionTokens, StartupError> {
    match config.jwt_secret() {
        Some(secret) => Ok(JwtSessionTokens::new(secret.as_bytes())),
        None if config.ephemeral_secret_allowed() => {
            warn!("no token secret configured; sessions will not survive a restart");
            Ok(JwtSessionTokens::ephemeral())
        }
        None => Err(ConfigError::MissingJwtSecret.into()),
    }
}

/// Validate the seed values from configuration.
///
/// A missing invitation code is replaced by a random one, which only takes
/// effect when the store holds no code yet.
///
/// # Errors
/// [`StartupError::InvalidSetting`] naming the first invalid value.
pub fn seed_defaults(config: &AppConfig) -> Result<SeedDefaults, StartupError> {
    let admin_username = Username::new(config.admin_username())
        .map_err(|err| invalid_setting("admin_username", err))?;
    let admin_password = config
        .admin_password
        .as_deref()
        .map(NewPassword::new)
        .transpose()
        .map_err(|err| invalid_setting("admin_password", err))?;
    let admin_email = config
        .admin_email
        .as_deref()
        .map(EmailAddress::new)
        .transpose()
        .map_err(|err| invalid_setting("admin_email", err))?;
    let room_name = RoomName::new(config.default_room_name())
        .map_err(|err| invalid_setting("default_room_name", err))?;
    let invitation_code = match config.default_invitation_code.as_deref() {
        Some(code) => InvitationCode::new(code),
        None => InvitationCode::new(generated_invitation_code()),
    }
    .map_err(|err| invalid_setting("default_invitation_code", err))?;
    Ok(SeedDefaults {
        admin_username,
        admin_password,
        admin_email,
        room_name,
        invitation_code,
    })
}

fn generated_invitation_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_INVITATION_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Run the legacy import (when configured) and then default seeding.
///
/// # Errors
/// Propagates unreadable snapshots and store failures.
pub async fn run_data_tasks<B, H>(
    service: &BootstrapService<B, H>,
    config: &AppConfig,
) -> Result<StartupReport, StartupError>
where
    B: BootstrapRepository,
    H: CredentialHasher,
{
    let defaults = seed_defaults(config)?;
    let import = match config.legacy_json_path.as_deref() {
        Some(path) => match read_snapshot(path)? {
            Some(raw) => Some(service.import_legacy(&raw).await?),
            None => {
                info!(path = %path.display(), "legacy snapshot not found; skipping import");
                None
            }
        },
        None => None,
    };
    let seed = service.seed_defaults(&defaults).await?;
    Ok(StartupReport { import, seed })
}

fn read_snapshot(path: &Path) -> Result<Option<String>, StartupError> {
    let read_error = |source| StartupError::LegacyRead {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        read_error(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "snapshot path must name a file",
        ))
    })?;
    let dir = match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(read_error(err)),
    };
    match dir.read_to_string(Path::new(file_name)) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(read_error(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use crate::domain::SeedStatus;
    use crate::domain::ports::UserRepository;
    use crate::test_support::cap_fs::write_file;
    use crate::test_support::{InMemoryStore, MutableClock, PlaintextHasher};

    fn config() -> AppConfig {
        AppConfig {
            database_url: None,
            bind_addr: None,
            jwt_secret: None,
            allow_ephemeral_secret: false,
            token_ttl_hours: None,
            admin_username: None,
            admin_password: Some("correct horse".to_owned()),
            admin_email: None,
            default_room_name: None,
            default_invitation_code: Some("welcome-in".to_owned()),
            require_email: false,
            legacy_json_path: None,
            pool_max_size: None,
        }
    }

    struct Harness {
        store: Arc<InMemoryStore>,
        service: BootstrapService<InMemoryStore, PlaintextHasher>,
    }

    #[fixture]
    fn harness() -> Harness {
        let store = Arc::new(InMemoryStore::new());
        let clock = MutableClock::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
                .single()
                .expect("valid instant"),
        );
        let service =
            BootstrapService::new(store.clone(), Arc::new(PlaintextHasher), Arc::new(clock));
        Harness { store, service }
    }

    #[rstest]
    fn seed_values_are_validated() {
        let mut settings = config();
        settings.admin_password = Some("short".to_owned());
        let err = seed_defaults(&settings).expect_err("short password");
        assert!(matches!(
            err,
            StartupError::InvalidSetting {
                setting: "admin_password",
                ..
            }
        ));
    }

    #[rstest]
    fn missing_invitation_code_is_generated() {
        let mut settings = config();
        settings.default_invitation_code = None;
        let defaults = seed_defaults(&settings).expect("valid defaults");
        assert_eq!(
            defaults.invitation_code.as_str().chars().count(),
            GENERATED_INVITATION_CODE_LEN
        );
    }

    #[rstest]
    fn configured_secret_builds_session_tokens() {
        let mut settings = config();
        settings.jwt_secret = Some("s3cret".to_owned());
        assert!(session_tokens(&settings).is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn fresh_store_is_seeded(harness: Harness) {
        let report = run_data_tasks(&harness.service, &config())
            .await
            .expect("data tasks succeed");

        assert_eq!(report.import, None);
        assert_eq!(report.seed.admin, SeedStatus::Created);
        assert_eq!(report.seed.room, SeedStatus::Created);
        let admin = harness
            .store
            .find_account_by_username("admin")
            .await
            .expect("lookup succeeds");
        assert!(admin.is_some_and(|account| account.user.role.is_admin()));
    }

    #[rstest]
    #[tokio::test]
    async fn missing_snapshot_file_is_skipped(harness: Harness) {
        let dir = TempDir::new().expect("temp dir");
        let mut settings = config();
        settings.legacy_json_path = Some(dir.path().join("absent.json"));

        let report = run_data_tasks(&harness.service, &settings)
            .await
            .expect("data tasks succeed");

        assert_eq!(report.import, None);
        assert_eq!(report.seed.admin, SeedStatus::Created);
    }

    #[rstest]
    #[tokio::test]
    async fn snapshot_is_imported_once(harness: Harness) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("db.json");
        write_file(
            &path,
            br#"{
                "users": [{"id": 1, "username": "ana", "password": "plain$secret-pass", "role": "admin"}],
                "rooms": [{"id": 1, "name": "Kitchen"}],
                "items": [{"id": 4, "name": "Coffee", "roomId": 1, "price": 0.5}],
                "strokes": [{"id": 9, "itemId": 4, "userId": 1, "username": "ana"}],
                "invitationCode": "legacy-code"
            }"#,
        )
        .expect("write snapshot");
        let mut settings = config();
        settings.legacy_json_path = Some(path);

        let first = run_data_tasks(&harness.service, &settings)
            .await
            .expect("first start");
        let second = run_data_tasks(&harness.service, &settings)
            .await
            .expect("second start");

        assert_eq!(
            first.import,
            Some(ImportOutcome::Imported {
                users: 1,
                rooms: 1,
                items: 1,
                strokes: 1,
            })
        );
        assert_eq!(first.seed.admin, SeedStatus::AlreadyPresent);
        assert_eq!(second.import, Some(ImportOutcome::SkippedExistingData));
        assert_eq!(harness.store.stroke_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn snapshot_without_an_administrator_aborts_startup(harness: Harness) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("db.json");
        write_file(
            &path,
            br#"{
                "users": [{"id": 1, "username": "bob", "password": "plain$x", "role": "user"}],
                "rooms": [{"id": 1, "name": "General"}]
            }"#,
        )
        .expect("write snapshot");
        let mut settings = config();
        settings.legacy_json_path = Some(path);

        let result = run_data_tasks(&harness.service, &settings).await;

        assert!(matches!(result, Err(StartupError::Bootstrap(_))));
        let users = UserRepository::list(&*harness.store).await.expect("users");
        assert!(users.is_empty());
    }
}
