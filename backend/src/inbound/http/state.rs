//! Shared HTTP adapter state.
//!
//! Handlers receive this state via `actix_web::web::Data` and only depend on
//! the driving ports, so they stay testable without I/O.

use std::sync::Arc;

use chrono::TimeDelta;
use mockable::Clock;

use crate::domain::ports::{
    AccessControl, Authentication, BillingPeriodRepository, BillingPeriods, Catalogue,
    CredentialHasher, ItemRepository, Registration, RoomRepository, SessionTokens,
    SettingsRepository, StrokeLedger, StrokeRepository, UserAdministration, UserRepository,
};
use crate::domain::{
    AccessService, BillingService, CatalogueRepositories, CatalogueService, CredentialService,
    DEFAULT_TOKEN_TTL_HOURS, LedgerService, RegistrationService, UserAdminService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub access: Arc<dyn AccessControl>,
    pub authentication: Arc<dyn Authentication>,
    pub registration: Arc<dyn Registration>,
    pub users: Arc<dyn UserAdministration>,
    pub catalogue: Arc<dyn Catalogue>,
    pub ledger: Arc<dyn StrokeLedger>,
    pub billing_periods: Arc<dyn BillingPeriods>,
}

/// Driven adapters the services are built over.
pub struct StateRepositories<U, S, R, I, K, B> {
    pub users: Arc<U>,
    pub settings: Arc<S>,
    pub rooms: Arc<R>,
    pub items: Arc<I>,
    pub strokes: Arc<K>,
    pub periods: Arc<B>,
}

/// Credential adapters and policy knobs shared by the services.
pub struct StateServices<H, T> {
    pub hasher: Arc<H>,
    pub tokens: Arc<T>,
    pub clock: Arc<dyn Clock>,
    pub token_ttl: TimeDelta,
    pub require_email: bool,
}

impl<H, T> StateServices<H, T> {
    /// Default session lifetime, optional email.
    pub fn new(hasher: Arc<H>, tokens: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self {
            hasher,
            tokens,
            clock,
            token_ttl: TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS),
            require_email: false,
        }
    }
}

impl HttpState {
    /// Wire every domain service over the given adapters.
    ///
    /// The same assembly serves the Diesel adapters in production and the
    /// in-memory store in integration tests.
    pub fn assemble<U, S, R, I, K, B, H, T>(
        repositories: StateRepositories<U, S, R, I, K, B>,
        services: StateServices<H, T>,
    ) -> Self
    where
        U: UserRepository + 'static,
        S: SettingsRepository + 'static,
        R: RoomRepository + 'static,
        I: ItemRepository + 'static,
        K: StrokeRepository + 'static,
        B: BillingPeriodRepository + 'static,
        H: CredentialHasher + 'static,
        T: SessionTokens + 'static,
    {
        let StateRepositories {
            users,
            settings,
            rooms,
            items,
            strokes,
            periods,
        } = repositories;
        let StateServices {
            hasher,
            tokens,
            clock,
            token_ttl,
            require_email,
        } = services;

        Self {
            access: Arc::new(AccessService::new(
                users.clone(),
                tokens.clone(),
                clock.clone(),
            )),
            authentication: Arc::new(
                CredentialService::new(users.clone(), hasher.clone(), tokens, clock.clone())
                    .with_token_ttl(token_ttl),
            ),
            registration: Arc::new(
                RegistrationService::new(
                    users.clone(),
                    settings.clone(),
                    hasher.clone(),
                    clock.clone(),
                )
                .with_required_email(require_email),
            ),
            users: Arc::new(UserAdminService::new(users.clone(), settings, hasher)),
            catalogue: Arc::new(CatalogueService::new(
                CatalogueRepositories {
                    rooms,
                    items: items.clone(),
                    users,
                    periods: periods.clone(),
                },
                clock.clone(),
            )),
            ledger: Arc::new(LedgerService::new(
                strokes,
                items,
                periods.clone(),
                clock.clone(),
            )),
            billing_periods: Arc::new(BillingService::new(periods, clock)),
        }
    }
}
