use chrono::Utc;
use serde::Deserialize;

use crate::utils::base64url_decode;

/// Claims carried by the console's signed access token. Only the fields the
/// client inspects are modeled; unknown claims are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
}

/// Decode the claims segment of a signed token without verifying the
/// signature. The client only needs the expiry; trust in the token's content
/// belongs to the server.
///
/// Returns `None` for any structurally malformed input.
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    let payload = base64url_decode(parts[1]).ok()?;
    serde_json::from_slice(&payload).ok()
}

/// The `exp` claim, if the token decodes and carries one.
pub fn expiry_epoch_seconds(token: &str) -> Option<i64> {
    decode_claims(token)?.exp
}

/// Seconds until the token's expiry claim, clamped at zero.
///
/// Malformed and already-expired tokens both read as zero so callers treat
/// "unknown" and "expired" uniformly as no time left.
pub fn seconds_remaining(token: &str) -> u64 {
    seconds_remaining_at(token, Utc::now().timestamp())
}

fn seconds_remaining_at(token: &str, now: i64) -> u64 {
    match expiry_epoch_seconds(token) {
        Some(exp) if exp > now => (exp - now) as u64,
        _ => 0,
    }
}
