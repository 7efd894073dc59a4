//! Local access-token inspection
//!
//! Tokens are compact JWTs. Only the claims segment is decoded, and only
//! to skip a request that would certainly be rejected. Signatures are not
//! checked here; the server remains the authority on validity.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Claims read from a token payload
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TokenClaims {
    /// Expiry as seconds since the Unix epoch
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub sub: Option<String>,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

/// Decode the claims of a compact `header.payload.signature` token
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Whether the token is known to be expired at `now`.
///
/// A token that cannot be decoded, or carries no `exp`, is never reported
/// as expired.
pub fn is_expired(token: &str, now: DateTime<Utc>, leeway: Duration) -> bool {
    decode_claims(token)
        .and_then(|claims| claims.expires_at())
        .is_some_and(|expires_at| expires_at <= now + leeway)
}
