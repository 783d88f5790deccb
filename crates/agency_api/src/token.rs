//! Read-only view of access-token claims.
//!
//! The auth service issues JWTs whose payload carries `sub` (the account
//! email) and `exp` (expiry, seconds since the Unix epoch). Signatures are not
//! checked here; claims are only used to avoid pointless network calls.

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: Option<String>,
    pub expires_at: Option<i64>,
}

impl TokenClaims {
    /// True when the token carries an expiry at or before `now` (epoch seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    exp: Option<Value>,
}

/// Decode the payload segment of a three-part JWT. Returns `None` for opaque
/// tokens.
pub fn decode_token_claims(token: &str) -> Option<TokenClaims> {
    let mut parts = token.trim().split('.');
    let _header = parts.next()?;
    let payload_segment = parts.next()?;
    let _signature = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let decoded = decode_jwt_segment(payload_segment)?;
    let claims = serde_json::from_slice::<RawClaims>(&decoded).ok()?;

    Some(TokenClaims {
        subject: claims
            .sub
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty()),
        expires_at: claims.exp.as_ref().and_then(epoch_seconds),
    })
}

fn decode_jwt_segment(segment: &str) -> Option<Vec<u8>> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| general_purpose::URL_SAFE.decode(segment))
        .ok()
}

fn epoch_seconds(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|seconds| seconds.floor() as i64))
}
