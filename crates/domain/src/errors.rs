//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Syndio
///
/// Connection-lifecycle failures get their own variants because callers
/// branch on them: a callback handler rejects `InvalidState` and
/// `StateExpired` with a client error, while `ReauthRequired` maps to a
/// "reconnect this account" prompt rather than a generic failure.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyndioError {
    /// Unknown or already-consumed CSRF state token. Never retried.
    #[error("Invalid or reused OAuth state")]
    InvalidState,

    /// CSRF state token existed but was past its TTL.
    #[error("OAuth state expired")]
    StateExpired,

    /// The consumed state belongs to a different user than the caller.
    #[error("OAuth state user mismatch")]
    UserMismatch,

    /// Provider rejected the authorization-code exchange. Carries the
    /// provider's error body for operator diagnosis; never retried
    /// automatically (authorization codes are single-use).
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// Token obtained but the identity lookup failed. The token is
    /// discarded; nothing is persisted.
    #[error("Identity fetch failed: {0}")]
    IdentityFetchFailed(String),

    /// Provider rejected the refresh-token grant.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The platform has no refresh concept (e.g. Facebook page tokens).
    #[error("Token refresh not supported by this platform")]
    RefreshUnsupported,

    /// Stored credentials are stale and cannot be refreshed; the user must
    /// redo the connect flow.
    #[error("Re-authentication required")]
    ReauthRequired,

    /// Account or state absent. Returned uniformly whether the row never
    /// existed or belongs to another user.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Syndio operations
pub type Result<T> = std::result::Result<T, SyndioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_failures_are_distinct_variants() {
        let failed = SyndioError::RefreshFailed("invalid_grant".into());
        let unsupported = SyndioError::RefreshUnsupported;

        assert!(failed.to_string().contains("invalid_grant"));
        assert!(unsupported.to_string().contains("not supported"));
    }

    #[test]
    fn errors_serialize_with_type_tag() {
        let err = SyndioError::TokenExchangeFailed("bad code".into());
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["type"], "TokenExchangeFailed");
        assert_eq!(json["message"], "bad code");
    }

    #[test]
    fn unit_variants_round_trip() {
        let err = SyndioError::InvalidState;
        let json = serde_json::to_string(&err).unwrap();
        let back: SyndioError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, SyndioError::InvalidState));
    }
}
