//! Builds the HTTP state over the Diesel adapters.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;

use fixtrack::domain::BootstrapService;
use fixtrack::inbound::http::state::{HttpState, StateRepositories, StateServices};
use fixtrack::outbound::credentials::Argon2Hasher;
use fixtrack::outbound::persistence::{
    DbPool, DieselBillingPeriodRepository, DieselBootstrapRepository, DieselItemRepository,
    DieselRoomRepository, DieselSettingsRepository, DieselStrokeRepository, DieselUserRepository,
};

use super::ServerConfig;

fn repositories(
    pool: &DbPool,
) -> StateRepositories<
    DieselUserRepository,
    DieselSettingsRepository,
    DieselRoomRepository,
    DieselItemRepository,
    DieselStrokeRepository,
    DieselBillingPeriodRepository,
> {
    StateRepositories {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        settings: Arc::new(DieselSettingsRepository::new(pool.clone())),
        rooms: Arc::new(DieselRoomRepository::new(pool.clone())),
        items: Arc::new(DieselItemRepository::new(pool.clone())),
        strokes: Arc::new(DieselStrokeRepository::new(pool.clone())),
        periods: Arc::new(DieselBillingPeriodRepository::new(pool.clone())),
    }
}

/// Build the shared HTTP state from the configured pool and credentials.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let services = StateServices {
        token_ttl: config.token_ttl,
        require_email: config.require_email,
        ..StateServices::new(
            Arc::new(Argon2Hasher::new()),
            Arc::new(config.tokens.clone()),
            Arc::new(DefaultClock),
        )
    };
    web::Data::new(HttpState::assemble(repositories(&config.db_pool), services))
}

/// Startup data service writing through the Diesel bootstrap adapter.
pub fn build_bootstrap_service(
    pool: &DbPool,
) -> BootstrapService<DieselBootstrapRepository, Argon2Hasher> {
    BootstrapService::new(
        Arc::new(DieselBootstrapRepository::new(pool.clone())),
        Arc::new(Argon2Hasher::new()),
        Arc::new(DefaultClock),
    )
}
