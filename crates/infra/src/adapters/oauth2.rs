//! Shared OAuth2 plumbing for the platform adapters
//!
//! Providers differ in scopes, endpoints, and expiry semantics but share
//! the authorization-URL shape and the token-response JSON. Everything
//! platform-specific stays in the per-platform files.

use serde::{Deserialize, Serialize};
use syndio_domain::{Result, SyndioError, TokenGrant};
use url::Url;

/// The provider URLs an adapter talks to. Production defaults live in each
/// adapter's constructor; tests point these at a local mock server.
#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub authorize: String,
    pub token: String,
    pub identity: String,
    /// Second-hop exchange for providers that trade a short-lived token for
    /// a long-lived one (Facebook, Threads).
    pub long_lived: Option<String>,
    /// Separate refresh endpoint when it is not the token endpoint.
    pub refresh: Option<String>,
    pub revoke: Option<String>,
}

/// Build an authorization URL from a base endpoint and query pairs.
pub(crate) fn build_url(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(base)
        .map_err(|err| SyndioError::Config(format!("invalid provider url {base}: {err}")))?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url.into())
}

/// Standard OAuth2 token-endpoint response. Providers omit fields freely,
/// so everything past the access token is optional.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub(crate) fn into_grant(self) -> TokenGrant {
        TokenGrant {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
        }
    }
}

/// Serialize an identity payload for the account's metadata column.
pub(crate) fn to_metadata<T: Serialize>(payload: &T) -> serde_json::Value {
    serde_json::to_value(payload).unwrap_or(serde_json::Value::Null)
}
