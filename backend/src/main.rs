//! FixTrack server entry-point: loads configuration, prepares the database,
//! runs the first-start data tasks and serves the REST API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig as _;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use fixtrack::bootstrap::{
    AppConfig, StartupError, prepare_database, run_data_tasks, session_tokens,
};
use fixtrack::inbound::http::health::HealthState;
use server::{ServerConfig, build_bootstrap_service, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = AppConfig::load_from_iter(std::env::args_os()).map_err(|err| std::io::Error::other(err.to_string()))?;
    let bind_addr = config.bind_addr().map_err(StartupError::from)?;
    let token_ttl = config.token_ttl().map_err(StartupError::from)?;
    let tokens = session_tokens(&config)?;

    let pool = prepare_database(&config).await?;
    let report = run_data_tasks(&build_bootstrap_service(&pool), &config).await?;
    info!(import = ?report.import, seed = ?report.seed, "startup data tasks complete");

    let server_config = ServerConfig::new(bind_addr, pool, tokens)
        .with_token_ttl(token_ttl)
        .with_required_email(config.require_email);
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, &server_config)?;
    info!(%bind_addr, "listening");
    server.await
}
