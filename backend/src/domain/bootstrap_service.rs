//! Startup data tasks: one-off legacy import and idempotent default seeding.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::ports::{BootstrapRepository, CredentialHasher};
use super::repository_errors::{map_bootstrap_error, map_hasher_error};
use super::{
    DefaultSeed, Description, EmailAddress, Error, ImportOutcome, InvitationCode, LegacyImport,
    NewPassword, NewRoom, NewUser, Role, RoomName, SeedReport, SeedStatus, Username,
};

/// Values used when seeding an empty store.
#[derive(Debug, Clone)]
pub struct SeedDefaults {
    pub admin_username: Username,
    /// Without a password no admin is created and a warning is logged.
    pub admin_password: Option<NewPassword>,
    pub admin_email: Option<EmailAddress>,
    pub room_name: RoomName,
    pub invitation_code: InvitationCode,
}

/// Runs the startup data tasks against a [`BootstrapRepository`].
#[derive(Clone)]
pub struct BootstrapService<B, H> {
    store: Arc<B>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<B, H> BootstrapService<B, H>
where
    B: BootstrapRepository,
    H: CredentialHasher,
{
    /// Create a service writing through `store`.
    pub fn new(store: Arc<B>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            hasher,
            clock,
        }
    }

    /// Parse a legacy JSON snapshot and import it unless accounts exist.
    ///
    /// # Errors
    /// Returns `invalid_request` when the snapshot cannot be parsed or holds
    /// invalid entities; nothing is written in that case.
    pub async fn import_legacy(&self, raw: &str) -> Result<ImportOutcome, Error> {
        let import = LegacyImport::from_json(raw, self.clock.utc())
            .map_err(|error| Error::invalid_request(format!("legacy snapshot rejected: {error}")))?;
        if import.is_empty() {
            info!("legacy snapshot is empty; nothing to import");
            return Ok(ImportOutcome::SkippedExistingData);
        }
        let outcome = self
            .store
            .import_legacy(&import)
            .await
            .map_err(map_bootstrap_error)?;
        match outcome {
            ImportOutcome::Imported {
                users,
                rooms,
                items,
                strokes,
            } => info!(users, rooms, items, strokes, "legacy snapshot imported"),
            ImportOutcome::SkippedExistingData => {
                info!("accounts already exist; legacy snapshot skipped");
            }
        }
        Ok(outcome)
    }

    /// Ensure the bootstrap admin, default room and invitation code exist.
    pub async fn seed_defaults(&self, defaults: &SeedDefaults) -> Result<SeedReport, Error> {
        let now = self.clock.utc();
        let admin = match &defaults.admin_password {
            Some(password) => Some(NewUser {
                username: defaults.admin_username.clone(),
                email: defaults.admin_email.clone(),
                role: Role::Admin,
                password_digest: self
                    .hasher
                    .hash(password)
                    .await
                    .map_err(map_hasher_error)?,
                created_at: now,
            }),
            None => None,
        };
        let seed = DefaultSeed {
            admin,
            room: NewRoom {
                name: defaults.room_name.clone(),
                description: Description::default(),
                created_by: None,
                created_at: now,
            },
            invitation_code: defaults.invitation_code.clone(),
        };
        let report = self
            .store
            .seed_defaults(&seed)
            .await
            .map_err(map_bootstrap_error)?;
        if report.admin == SeedStatus::Missing {
            warn!("no accounts exist and no admin password is configured; nobody can log in");
        }
        info!(
            admin = ?report.admin,
            room = ?report.room,
            invitation_code = ?report.invitation_code,
            "default data ensured"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::PasswordDigest;
    use crate::domain::ports::{MockBootstrapRepository, MockCredentialHasher};
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn defaults() -> SeedDefaults {
        SeedDefaults {
            admin_username: Username::new("admin").expect("valid username"),
            admin_password: Some(NewPassword::new("changeme").expect("valid password")),
            admin_email: None,
            room_name: RoomName::new("General").expect("valid name"),
            invitation_code: InvitationCode::new("welcome").expect("valid code"),
        }
    }

    fn hasher() -> MockCredentialHasher {
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash()
            .returning(|_| Ok(PasswordDigest::new("digest")));
        hasher
    }

    #[rstest]
    #[tokio::test]
    async fn seeding_hashes_admin_password(defaults: SeedDefaults) {
        let mut store = MockBootstrapRepository::new();
        store
            .expect_seed_defaults()
            .withf(|seed| {
                seed.admin
                    .as_ref()
                    .is_some_and(|admin| admin.role == Role::Admin)
                    && seed.room.name.as_ref() == "General"
            })
            .return_once(|_| {
                Ok(SeedReport {
                    admin: SeedStatus::Created,
                    room: SeedStatus::Created,
                    invitation_code: SeedStatus::Created,
                })
            });
        let service = BootstrapService::new(Arc::new(store), Arc::new(hasher()), Arc::new(DefaultClock));

        let report = service.seed_defaults(&defaults).await.expect("seeded");
        assert_eq!(report.admin, SeedStatus::Created);
    }

    #[rstest]
    #[tokio::test]
    async fn seeding_without_password_skips_admin(mut defaults: SeedDefaults) {
        defaults.admin_password = None;
        let mut store = MockBootstrapRepository::new();
        store
            .expect_seed_defaults()
            .withf(|seed| seed.admin.is_none())
            .return_once(|_| {
                Ok(SeedReport {
                    admin: SeedStatus::Missing,
                    room: SeedStatus::AlreadyPresent,
                    invitation_code: SeedStatus::AlreadyPresent,
                })
            });
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash().never();
        let service = BootstrapService::new(Arc::new(store), Arc::new(hasher), Arc::new(DefaultClock));

        let report = service.seed_defaults(&defaults).await.expect("seeded");
        assert_eq!(report.admin, SeedStatus::Missing);
    }

    #[rstest]
    #[tokio::test]
    async fn malformed_snapshot_writes_nothing() {
        let mut store = MockBootstrapRepository::new();
        store.expect_import_legacy().never();
        let service = BootstrapService::new(Arc::new(store), Arc::new(hasher()), Arc::new(DefaultClock));

        let error = service
            .import_legacy("{ not json")
            .await
            .expect_err("rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[rstest]
    #[tokio::test]
    async fn snapshot_is_handed_to_store() {
        let mut store = MockBootstrapRepository::new();
        store
            .expect_import_legacy()
            .withf(|import| import.users.len() == 1)
            .return_once(|_| {
                Ok(ImportOutcome::Imported {
                    users: 1,
                    rooms: 0,
                    items: 0,
                    strokes: 0,
                })
            });
        let service = BootstrapService::new(Arc::new(store), Arc::new(hasher()), Arc::new(DefaultClock));

        let raw = r#"{"users":[{"id":1,"username":"admin","password":"$2b$10$x","role":"admin"}]}"#;
        let outcome = service.import_legacy(raw).await.expect("imported");
        assert!(matches!(outcome, ImportOutcome::Imported { users: 1, .. }));
    }
}
