//! Bearer token inspection.
//!
//! The dashboard never verifies token signatures; that is the backend's job.
//! It only reads the `exp` claim to decide whether a persisted session is still
//! worth restoring.

use jsonwebtoken::dangerous::insecure_decode;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    /// Expiration time (UNIX timestamp, seconds).
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub role: Option<String>,
}

impl TokenClaims {
    /// Whether the token has expired at `now` (UNIX seconds).
    ///
    /// Tokens without an `exp` claim never expire.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp < now)
    }
}

/// Decode the claims of `token` without verifying its signature.
pub fn inspect(token: &str) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let data = insecure_decode::<TokenClaims>(token)?;
    Ok(data.claims)
}
