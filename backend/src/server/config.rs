//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use chrono::TimeDelta;
use fixtrack::domain::DEFAULT_TOKEN_TTL_HOURS;
use fixtrack::outbound::credentials::JwtSessionTokens;
use fixtrack::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) tokens: JwtSessionTokens,
    pub(crate) token_ttl: TimeDelta,
    pub(crate) require_email: bool,
}

impl ServerConfig {
    /// Construct a server configuration with the default session policy.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, db_pool: DbPool, tokens: JwtSessionTokens) -> Self {
        Self {
            bind_addr,
            db_pool,
            tokens,
            token_ttl: TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS),
            require_email: false,
        }
    }

    /// Override how long issued session tokens stay valid.
    #[must_use]
    pub const fn with_token_ttl(mut self, token_ttl: TimeDelta) -> Self {
        self.token_ttl = token_ttl;
        self
    }

    /// Make an email address mandatory at registration.
    #[must_use]
    pub const fn with_required_email(mut self, require_email: bool) -> Self {
        self.require_email = require_email;
        self
    }
}
