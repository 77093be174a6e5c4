use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Claims;

/// Why a token string could not be turned into usable claims. At the session
/// layer both variants collapse to "not authenticated".
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(&'static str),
    #[error("token expired")]
    Expired,
}

/// Decode the claims of a bearer token and check its expiry against `now`.
///
/// The signature is never verified here: this runs on the client, which has
/// no key material. The backend is the authority; this decode only exists so
/// the UI can branch on role and know when the credential lapses. `now` is a
/// parameter so tests can advance the clock.
pub fn decode_claims(token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed("expected three dot-separated segments"));
    }

    let payload = general_purpose::URL_SAFE_NO_PAD
        .decode(segments[1])
        .map_err(|_| TokenError::Malformed("payload is not base64url"))?;

    let claims: Claims = serde_json::from_slice(&payload)
        .map_err(|_| TokenError::Malformed("payload is not a claims object"))?;

    if claims.exp <= now.timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
