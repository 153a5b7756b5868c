//! Connection lifecycle orchestration
//!
//! `ConnectionManager` drives `init → callback → refresh → disconnect` over
//! the storage and adapter ports. Per-account states:
//! `disconnected → connected → (near-expiry) → refreshing → connected | stale`.
//!
//! Refreshes are single-flight per account id: providers may invalidate a
//! refresh token on use, so a second concurrent refresh with the same stale
//! token would fail. Concurrent callers serialize on a keyed lock and the
//! late caller reuses the first caller's result from the store.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use syndio_domain::{
    AuthorizationRequest, NewAccount, Platform, Result, SocialAccount, SyndioError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::pkce::PkceChallenge;
use super::ports::{PlatformAdapter, StateStore, TokenStore};

/// Orchestrates the OAuth connection lifecycle for every platform.
pub struct ConnectionManager {
    states: Arc<dyn StateStore>,
    tokens: Arc<dyn TokenStore>,
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConnectionManager {
    /// Create a manager with no registered adapters.
    #[must_use]
    pub fn new(states: Arc<dyn StateStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { states, tokens, adapters: HashMap::new(), refresh_locks: DashMap::new() }
    }

    /// Register a platform adapter, replacing any previous one for the same
    /// platform.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn PlatformAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    fn adapter(&self, platform: Platform) -> Result<&Arc<dyn PlatformAdapter>> {
        self.adapters
            .get(&platform)
            .ok_or_else(|| SyndioError::Config(format!("no adapter registered for {platform}")))
    }

    /// Begin a connect flow: persist a CSRF state and build the provider's
    /// authorization URL. No account exists yet.
    pub async fn init(&self, platform: Platform, user_id: &str) -> Result<AuthorizationRequest> {
        let adapter = self.adapter(platform)?;

        let (code_verifier, code_challenge) = if adapter.uses_pkce() {
            let challenge = PkceChallenge::generate();
            (challenge.code_verifier, Some(challenge.code_challenge))
        } else {
            (String::new(), None)
        };

        let state = self.states.create(platform, user_id, &code_verifier).await?;
        let auth_url = adapter.build_authorize_url(&state, code_challenge.as_deref())?;

        info!(platform = %platform, "generated authorization url");

        Ok(AuthorizationRequest { auth_url, state })
    }

    /// Complete a connect flow from the provider redirect.
    ///
    /// Consumes the CSRF state (fail-closed on mismatch or expiry), verifies
    /// the state belongs to the calling user, exchanges the code, resolves
    /// the remote identity, and upserts the account. Nothing is persisted
    /// unless every step succeeds; an identity failure discards the token
    /// rather than storing an unidentified account.
    pub async fn callback(
        &self,
        platform: Platform,
        user_id: &str,
        code: &str,
        state: &str,
    ) -> Result<SocialAccount> {
        let adapter = self.adapter(platform)?;

        let consumed = self.states.consume(state, platform).await?;
        if consumed.user_id != user_id {
            warn!(platform = %platform, "oauth state consumed by a different user");
            return Err(SyndioError::UserMismatch);
        }

        let code_verifier =
            (!consumed.code_verifier.is_empty()).then_some(consumed.code_verifier.as_str());

        let grant = adapter.exchange_code(code, code_verifier).await?;
        let identity = adapter.fetch_identity(&grant.access_token).await?;

        let expires_at = grant.expires_at();
        let account_id = self
            .tokens
            .upsert(NewAccount {
                user_id: user_id.to_string(),
                platform,
                platform_account_id: identity.platform_account_id,
                username: identity.username,
                profile_picture_url: identity.profile_picture_url,
                access_token: grant.access_token,
                refresh_token: grant.refresh_token,
                expires_at,
                metadata: identity.raw,
            })
            .await?;

        let account = self.tokens.get(&account_id, user_id, platform).await?;

        info!(
            platform = %platform,
            account_id = %account.id,
            "social account connected"
        );

        Ok(account)
    }

    /// Return an access token guaranteed fresh for at least the adapter's
    /// refresh buffer, transparently refreshing when needed.
    ///
    /// The boundary is inclusive: when exactly `refresh_buffer` remains
    /// before expiry, the refresh fires. Tokens without an expiry are
    /// returned as-is.
    ///
    /// # Errors
    /// `ReauthRequired` when the token is inside the buffer and cannot be
    /// refreshed (no refresh token, provider rejection, or a platform with
    /// no refresh concept). Callers must not retry; the user redoes the
    /// connect flow.
    pub async fn get_valid_token(
        &self,
        account_id: &str,
        user_id: &str,
        platform: Platform,
    ) -> Result<String> {
        let adapter = self.adapter(platform)?;
        let buffer = adapter.refresh_buffer();

        let account = self.tokens.get(account_id, user_id, platform).await?;
        if !account.needs_refresh(buffer) {
            return Ok(account.access_token);
        }

        // Single-flight: serialize refreshes per account id.
        let lock = self
            .refresh_locks
            .entry(account_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-read under the lock; a concurrent caller may have refreshed
        // while we waited.
        let account = self.tokens.get(account_id, user_id, platform).await?;
        if !account.needs_refresh(buffer) {
            debug!(account_id, "reusing token refreshed by concurrent caller");
            return Ok(account.access_token);
        }

        let Some(refresh_token) = account.refresh_token else {
            warn!(
                platform = %platform,
                account_id,
                "token near expiry with no refresh token; re-auth required"
            );
            return Err(SyndioError::ReauthRequired);
        };

        match adapter.refresh(&refresh_token).await {
            Ok(grant) => {
                self.tokens
                    .update_tokens(
                        account_id,
                        &grant.access_token,
                        grant.refresh_token.as_deref(),
                        grant.expires_at(),
                    )
                    .await?;
                info!(platform = %platform, account_id, "access token refreshed");
                Ok(grant.access_token)
            }
            Err(SyndioError::RefreshUnsupported) => {
                warn!(
                    platform = %platform,
                    account_id,
                    "platform has no refresh concept; account stale"
                );
                Err(SyndioError::ReauthRequired)
            }
            Err(SyndioError::RefreshFailed(message)) => {
                warn!(
                    platform = %platform,
                    account_id,
                    provider_error = %message,
                    "token refresh rejected; account stale"
                );
                Err(SyndioError::ReauthRequired)
            }
            Err(other) => Err(other),
        }
    }

    /// Disconnect an account: best-effort provider revoke, then hard
    /// delete. Returns `false` when the account was already gone.
    pub async fn disconnect(
        &self,
        account_id: &str,
        user_id: &str,
        platform: Platform,
    ) -> Result<bool> {
        // Revoke needs the stored token; a missing account just means there
        // is nothing to revoke.
        if let Ok(account) = self.tokens.get(account_id, user_id, platform).await {
            if let Ok(adapter) = self.adapter(platform) {
                if let Err(err) = adapter.revoke(&account.access_token).await {
                    warn!(
                        platform = %platform,
                        account_id,
                        error = %err,
                        "provider token revoke failed; continuing with local delete"
                    );
                }
            }
        }

        let removed = self.tokens.delete(account_id, user_id, platform).await?;
        if removed {
            self.refresh_locks.remove(account_id);
            info!(platform = %platform, account_id, "social account disconnected");
        }
        Ok(removed)
    }

    /// All connected accounts for a user, optionally scoped to a platform.
    pub async fn list_accounts(
        &self,
        user_id: &str,
        platform: Option<Platform>,
    ) -> Result<Vec<SocialAccount>> {
        self.tokens.get_by_user(user_id, platform).await
    }
}
