//! Credential adapters: password digests and signed session tokens.

mod argon2_hasher;
mod jwt_session_tokens;

pub use argon2_hasher::Argon2Hasher;
pub use jwt_session_tokens::JwtSessionTokens;
