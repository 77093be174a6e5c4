use thiserror::Error;

use crate::token::TokenError;

/// Failures surfaced by the session manager. Decode and expiry problems on
/// tokens the manager holds are absorbed into state transitions and never
/// reach callers; the variants here are for credentials a caller handed in
/// directly and for the network paths.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The access token failed structural decode.
    #[error("access token is malformed")]
    MalformedCredential,

    /// The access token decoded but its expiry has passed.
    #[error("access token has expired")]
    ExpiredCredential,

    /// The backend rejected a login or account creation. Carries the
    /// backend's message when it sent one.
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    /// An authenticated call was rejected again after a successful refresh.
    #[error("session expired")]
    SessionExpired,

    /// The refresh exchange itself failed, rejected or unreachable. The
    /// session has been torn down.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed(_) => AuthError::MalformedCredential,
            TokenError::Expired => AuthError::ExpiredCredential,
        }
    }
}
