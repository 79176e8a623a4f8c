//! HS256 JSON Web Tokens for bearer sessions.
//!
//! Expiry is checked against the caller-supplied instant rather than the
//! system clock, so services stay testable with an injected clock.

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::ports::{SessionTokenError, SessionTokens};
use crate::domain::{Role, SessionClaims, SessionToken, UserId, Username};

/// Bytes of randomness in an ephemeral secret.
const EPHEMERAL_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    username: String,
    role: String,
    iat: i64,
    exp: i64,
}

impl WireClaims {
    fn from_domain(claims: &SessionClaims) -> Self {
        Self {
            sub: claims.user_id.get().to_string(),
            username: claims.username.as_ref().to_owned(),
            role: claims.role.as_str().to_owned(),
            iat: claims.issued_at.timestamp(),
            exp: claims.expires_at.timestamp(),
        }
    }

    fn into_domain(self) -> Result<SessionClaims, SessionTokenError> {
        let invalid = |what: &str| SessionTokenError::invalid(format!("malformed {what} claim"));
        let user_id = self.sub.parse::<i64>().map_err(|_| invalid("sub"))?;
        let username = Username::new(&self.username).map_err(|_| invalid("username"))?;
        let role = self.role.parse::<Role>().map_err(|_| invalid("role"))?;
        let issued_at = DateTime::from_timestamp(self.iat, 0).ok_or_else(|| invalid("iat"))?;
        let expires_at = DateTime::from_timestamp(self.exp, 0).ok_or_else(|| invalid("exp"))?;
        Ok(SessionClaims {
            user_id: UserId::new(user_id),
            username,
            role,
            issued_at,
            expires_at,
        })
    }
}

/// [`SessionTokens`] adapter signing with a shared HMAC secret.
#[derive(Clone)]
pub struct JwtSessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtSessionTokens {
    /// Adapter signing with `secret`.
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Adapter with a random secret; tokens do not survive a restart.
    #[must_use]
    pub fn ephemeral() -> Self {
        let secret = Zeroizing::new(rand::random::<[u8; EPHEMERAL_SECRET_LEN]>());
        Self::new(secret.as_slice())
    }
}

impl SessionTokens for JwtSessionTokens {
    fn issue(&self, claims: &SessionClaims) -> Result<SessionToken, SessionTokenError> {
        encode(
            &Header::new(Algorithm::HS256),
            &WireClaims::from_domain(claims),
            &self.encoding,
        )
        .map(SessionToken::new)
        .map_err(|err| SessionTokenError::signing(err.to_string()))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionTokenError> {
        let data = decode::<WireClaims>(token, &self.decoding, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => SessionTokenError::expired(),
                _ => SessionTokenError::invalid(err.to_string()),
            }
        })?;
        if data.claims.exp <= now.timestamp() {
            return Err(SessionTokenError::expired());
        }
        data.claims.into_domain()
    }
}
