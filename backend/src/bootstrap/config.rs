//! Application configuration loaded via OrthoConfig.
//!
//! Every field can come from a `FIXTRACK_*` environment variable, a CLI flag
//! or a configuration file. Optional values fall back to the defaults below
//! through accessor methods so the raw layers stay inspectable.

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::DEFAULT_TOKEN_TTL_HOURS;
use crate::outbound::persistence::DEFAULT_POOL_MAX_SIZE;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ROOM_NAME: &str = "General";

/// Errors raised while interpreting loaded configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("FIXTRACK_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid bind address {value:?}: {message}")]
    InvalidBindAddr { value: String, message: String },
    #[error("token lifetime must be at least one hour, got {hours}")]
    InvalidTokenTtl { hours: i64 },
    #[error("FIXTRACK_JWT_SECRET must be set outside debug builds")]
    MissingJwtSecret,
}

/// Runtime settings for the FixTrack server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FIXTRACK")]
pub struct AppConfig {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<String>,
    /// HMAC secret for session tokens.
    pub jwt_secret: Option<String>,
    /// Accept a random per-process token secret when none is configured.
    #[ortho_config(default = false)]
    pub allow_ephemeral_secret: bool,
    /// Session lifetime in hours.
    pub token_ttl_hours: Option<i64>,
    /// Username of the admin created when no accounts exist.
    pub admin_username: Option<String>,
    /// Password of that admin; without it no account is seeded.
    pub admin_password: Option<String>,
    /// Optional email for the seeded admin.
    pub admin_email: Option<String>,
    /// Name of the room seeded when none exist.
    pub default_room_name: Option<String>,
    /// Invitation code stored when none is set.
    pub default_invitation_code: Option<String>,
    /// Make an email address mandatory at registration.
    #[ortho_config(default = false)]
    pub require_email: bool,
    /// JSON snapshot imported on first start.
    pub legacy_json_path: Option<PathBuf>,
    /// Upper bound on pooled database connections.
    pub pool_max_size: Option<u32>,
}

impl AppConfig {
    /// Database URL, required for every deployment.
    ///
    /// # Errors
    /// [`ConfigError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    /// Listener address, `0.0.0.0:8080` unless overridden.
    ///
    /// # Errors
    /// [`ConfigError::InvalidBindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.trim()
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::InvalidBindAddr {
                value: raw.to_owned(),
                message: err.to_string(),
            })
    }

    /// Session lifetime.
    ///
    /// # Errors
    /// [`ConfigError::InvalidTokenTtl`] for zero or negative values.
    pub fn token_ttl(&self) -> Result<TimeDelta, ConfigError> {
        let hours = self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
        if hours < 1 {
            return Err(ConfigError::InvalidTokenTtl { hours });
        }
        TimeDelta::try_hours(hours).ok_or(ConfigError::InvalidTokenTtl { hours })
    }

    /// Token secret, if one is configured and non-empty.
    #[must_use]
    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|secret| !secret.is_empty())
    }

    /// Whether a missing secret may be replaced by a random one.
    #[must_use]
    pub const fn ephemeral_secret_allowed(&self) -> bool {
        cfg!(debug_assertions) || self.allow_ephemeral_secret
    }

    /// Seeded admin username.
    #[must_use]
    pub fn admin_username(&self) -> &str {
        self.admin_username
            .as_deref()
            .unwrap_or(DEFAULT_ADMIN_USERNAME)
    }

    /// Seeded room name.
    #[must_use]
    pub fn default_room_name(&self) -> &str {
        self.default_room_name.as_deref().unwrap_or(DEFAULT_ROOM_NAME)
    }

    /// Pool size, ten unless overridden.
    #[must_use]
    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }
}

#[cfg(test)]
mod tests {
    //! Configuration parsing and fallback tests.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 13] = [
        "FIXTRACK_DATABASE_URL",
        "FIXTRACK_BIND_ADDR",
        "FIXTRACK_JWT_SECRET",
        "FIXTRACK_ALLOW_EPHEMERAL_SECRET",
        "FIXTRACK_TOKEN_TTL_HOURS",
        "FIXTRACK_ADMIN_USERNAME",
        "FIXTRACK_ADMIN_PASSWORD",
        "FIXTRACK_ADMIN_EMAIL",
        "FIXTRACK_DEFAULT_ROOM_NAME",
        "FIXTRACK_DEFAULT_INVITATION_CODE",
        "FIXTRACK_REQUIRE_EMAIL",
        "FIXTRACK_LEGACY_JSON_PATH",
        "FIXTRACK_POOL_MAX_SIZE",
    ];

    fn load_from_empty_args() -> AppConfig {
        AppConfig::load_from_iter([OsString::from("fixtrack")]).expect("config should load")
    }

    fn cleared_env_with(
        overrides: &[(&'static str, &'static str)],
    ) -> Vec<(&'static str, Option<String>)> {
        VARS.iter()
            .map(|name| {
                let value = overrides
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| (*value).to_owned());
                (*name, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(cleared_env_with(&[]));

        let config = load_from_empty_args();
        assert_eq!(config.database_url(), Err(ConfigError::MissingDatabaseUrl));
        assert_eq!(
            config.bind_addr(),
            Ok(SocketAddr::from(([0, 0, 0, 0], 8080)))
        );
        assert_eq!(config.token_ttl(), Ok(TimeDelta::hours(24)));
        assert_eq!(config.admin_username(), "admin");
        assert_eq!(config.default_room_name(), "General");
        assert_eq!(config.pool_max_size(), DEFAULT_POOL_MAX_SIZE);
        assert!(!config.require_email);
        assert!(config.legacy_json_path.is_none());
        assert!(config.jwt_secret().is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(cleared_env_with(&[
            ("FIXTRACK_DATABASE_URL", "postgres://db/fixtrack"),
            ("FIXTRACK_BIND_ADDR", "127.0.0.1:9000"),
            ("FIXTRACK_JWT_SECRET", "s3cret"),
            ("FIXTRACK_TOKEN_TTL_HOURS", "6"),
            ("FIXTRACK_ADMIN_USERNAME", "root"),
            ("FIXTRACK_REQUIRE_EMAIL", "true"),
            ("FIXTRACK_LEGACY_JSON_PATH", "/srv/fixtrack/db.json"),
            ("FIXTRACK_POOL_MAX_SIZE", "3"),
        ]));

        let config = load_from_empty_args();
        assert_eq!(config.database_url(), Ok("postgres://db/fixtrack"));
        assert_eq!(
            config.bind_addr(),
            Ok(SocketAddr::from(([127, 0, 0, 1], 9000)))
        );
        assert_eq!(config.jwt_secret(), Some("s3cret"));
        assert_eq!(config.token_ttl(), Ok(TimeDelta::hours(6)));
        assert_eq!(config.admin_username(), "root");
        assert!(config.require_email);
        assert_eq!(
            config.legacy_json_path,
            Some(PathBuf::from("/srv/fixtrack/db.json"))
        );
        assert_eq!(config.pool_max_size(), 3);
    }

    #[rstest]
    #[case("0")]
    #[case("-4")]
    fn non_positive_token_lifetimes_are_rejected(#[case] hours: &'static str) {
        let _guard = lock_env(cleared_env_with(&[("FIXTRACK_TOKEN_TTL_HOURS", hours)]));

        let config = load_from_empty_args();
        assert!(matches!(
            config.token_ttl(),
            Err(ConfigError::InvalidTokenTtl { .. })
        ));
    }

    #[rstest]
    fn malformed_bind_addresses_are_reported() {
        let _guard = lock_env(cleared_env_with(&[("FIXTRACK_BIND_ADDR", "localhost")]));

        let config = load_from_empty_args();
        assert!(matches!(
            config.bind_addr(),
            Err(ConfigError::InvalidBindAddr { .. })
        ));
    }
}
