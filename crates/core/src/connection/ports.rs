//! Port interfaces for the connection lifecycle
//!
//! These traits define the boundaries between core business logic and
//! infrastructure implementations: durable state/token storage and the
//! per-platform OAuth adapters.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use syndio_domain::{
    ConsumedState, NewAccount, Platform, RemoteIdentity, Result, SocialAccount, TokenGrant,
};

/// Durable, TTL-bound storage for CSRF state tokens.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Generate and persist a new state token for `(user, platform)`.
    ///
    /// The token is cryptographically random and expires after the store's
    /// TTL (10 minutes by default).
    async fn create(&self, platform: Platform, user_id: &str, code_verifier: &str)
        -> Result<String>;

    /// Consume a state token, deleting it regardless of outcome.
    ///
    /// Must be atomic per state value: two concurrent consumes of the same
    /// token yield exactly one success.
    ///
    /// # Errors
    /// - `InvalidState` if the token is unknown or already consumed
    /// - `StateExpired` if the token existed but was past its TTL
    async fn consume(&self, state: &str, platform: Platform) -> Result<ConsumedState>;

    /// Remove expired state rows; returns the number deleted.
    async fn purge_expired(&self) -> Result<usize>;
}

/// Persistence for per-(user, platform, external-account) credentials.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert or update on the `(user_id, platform, platform_account_id)`
    /// uniqueness triple; returns the internal account id. Reconnecting the
    /// same external account must keep its existing id.
    async fn upsert(&self, account: NewAccount) -> Result<String>;

    /// Ownership-scoped read. Wrong owner and wrong platform both yield
    /// `NotFound` to avoid account enumeration.
    async fn get(
        &self,
        account_id: &str,
        user_id: &str,
        platform: Platform,
    ) -> Result<SocialAccount>;

    /// All accounts for a user, optionally filtered to one platform.
    async fn get_by_user(
        &self,
        user_id: &str,
        platform: Option<Platform>,
    ) -> Result<Vec<SocialAccount>>;

    /// Partial update after a refresh. An absent `refresh_token` keeps the
    /// stored one (providers that do not rotate); `expires_at` is written
    /// as given (`None` marks the token non-expiring).
    async fn update_tokens(
        &self,
        account_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Hard delete. Returns `false` when nothing matched.
    async fn delete(&self, account_id: &str, user_id: &str, platform: Platform) -> Result<bool>;
}

/// Everything platform-specific about OAuth and identity lookup.
///
/// One implementation per platform. Isolating these operations behind one
/// shape lets every platform share the manager's orchestration even though
/// token formats, PKCE usage, and expiry semantics differ wildly.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Whether the authorize/exchange round-trip carries a PKCE challenge.
    fn uses_pkce(&self) -> bool {
        false
    }

    /// How long before actual expiry a token is proactively refreshed.
    ///
    /// Long-lived page tokens declare 24 hours; short-lived OAuth2 tokens
    /// declare minutes.
    fn refresh_buffer(&self) -> Duration {
        Duration::seconds(300)
    }

    /// Construct the provider's authorization URL with client id, redirect
    /// URI, scopes, state, and (when PKCE) a code challenge.
    fn build_authorize_url(&self, state: &str, code_challenge: Option<&str>) -> Result<String>;

    /// Exchange an authorization code at the provider's token endpoint.
    ///
    /// # Errors
    /// `TokenExchangeFailed` carrying the provider's error body on non-2xx.
    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<TokenGrant>;

    /// Resolve the remote account behind an access token.
    ///
    /// # Errors
    /// `IdentityFetchFailed` on any provider error.
    async fn fetch_identity(&self, access_token: &str) -> Result<RemoteIdentity>;

    /// Obtain a new access token from a refresh token.
    ///
    /// # Errors
    /// `RefreshFailed` on provider rejection, or `RefreshUnsupported` when
    /// the platform has no refresh concept, so the caller degrades to
    /// "re-auth required" instead of retrying forever.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant>;

    /// Best-effort token revocation on disconnect. Default no-op for
    /// platforms without a revoke endpoint; failures are logged by the
    /// caller and never block the local delete.
    async fn revoke(&self, _access_token: &str) -> Result<()> {
        Ok(())
    }
}
