//! End-to-end connection lifecycle over real SQLite stores.
//!
//! The platform adapter is scripted in-process; everything below it (state
//! consumption, upserts, refresh persistence) runs against a real database
//! file.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use syndio_core::{ConnectionManager, PlatformAdapter, StateStore, TokenStore};
use syndio_domain::{Platform, RemoteIdentity, Result, SyndioError, TokenGrant};
use syndio_infra::{DbManager, SqliteStateStore, SqliteTokenStore};
use tempfile::TempDir;

struct ScriptedTwitter {
    refresh_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
}

impl ScriptedTwitter {
    fn new() -> Self {
        Self { refresh_calls: AtomicUsize::new(0), revoke_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl PlatformAdapter for ScriptedTwitter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn uses_pkce(&self) -> bool {
        true
    }

    fn refresh_buffer(&self) -> Duration {
        Duration::seconds(900)
    }

    fn build_authorize_url(&self, state: &str, code_challenge: Option<&str>) -> Result<String> {
        let challenge = code_challenge
            .ok_or_else(|| SyndioError::InvalidInput("pkce code challenge required".into()))?;
        Ok(format!(
            "https://twitter.test/authorize?state={state}&code_challenge={challenge}&code_challenge_method=S256"
        ))
    }

    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<TokenGrant> {
        assert_eq!(code, "auth-code-1");
        assert!(code_verifier.is_some_and(|v| !v.is_empty()));
        Ok(TokenGrant {
            access_token: "access-1".into(),
            refresh_token: Some("refresh-1".into()),
            expires_in: Some(7200),
        })
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<RemoteIdentity> {
        assert_eq!(access_token, "access-1");
        Ok(RemoteIdentity {
            platform_account_id: "42".into(),
            username: "alice".into(),
            profile_picture_url: Some("https://pbs.test/alice.png".into()),
            raw: serde_json::json!({"id": "42", "username": "alice"}),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(refresh_token, "refresh-1");
        Ok(TokenGrant {
            access_token: "access-2".into(),
            refresh_token: Some("refresh-2".into()),
            expires_in: Some(7200),
        })
    }

    async fn revoke(&self, _access_token: &str) -> Result<()> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Harness {
    manager: ConnectionManager,
    tokens: Arc<SqliteTokenStore>,
    states: Arc<SqliteStateStore>,
    adapter: Arc<ScriptedTwitter>,
    _guard: TempDir,
}

fn harness() -> Harness {
    let guard = TempDir::new().expect("temp dir created");
    let db = Arc::new(DbManager::new(guard.path().join("syndio.db"), 4).expect("db opened"));
    db.run_migrations().expect("migrations run");

    let states = Arc::new(SqliteStateStore::new(db.clone()));
    let tokens = Arc::new(SqliteTokenStore::new(db));
    let adapter = Arc::new(ScriptedTwitter::new());
    let manager = ConnectionManager::new(states.clone(), tokens.clone())
        .with_adapter(adapter.clone());

    Harness { manager, tokens, states, adapter, _guard: guard }
}

#[tokio::test]
async fn full_lifecycle_connect_refresh_disconnect() {
    let h = harness();

    // Connect: authorization URL carries the persisted state and a PKCE
    // challenge.
    let auth = h.manager.init(Platform::Twitter, "user1").await.unwrap();
    assert!(auth.auth_url.contains(&format!("state={}", auth.state)));
    assert!(auth.auth_url.contains("code_challenge="));

    // Provider redirect lands on the callback.
    let account =
        h.manager.callback(Platform::Twitter, "user1", "auth-code-1", &auth.state).await.unwrap();
    assert_eq!(account.platform_account_id, "42");
    assert_eq!(account.username, "alice");
    assert_eq!(account.access_token, "access-1");

    // Fresh token is served without touching the provider.
    let token =
        h.manager.get_valid_token(&account.id, "user1", Platform::Twitter).await.unwrap();
    assert_eq!(token, "access-1");
    assert_eq!(h.adapter.refresh_calls.load(Ordering::SeqCst), 0);

    // Push the token inside the refresh buffer; the next read refreshes and
    // persists the rotated pair.
    h.tokens
        .update_tokens(&account.id, "access-1", Some("refresh-1"), Some(Utc::now()))
        .await
        .unwrap();
    let token =
        h.manager.get_valid_token(&account.id, "user1", Platform::Twitter).await.unwrap();
    assert_eq!(token, "access-2");
    assert_eq!(h.adapter.refresh_calls.load(Ordering::SeqCst), 1);

    let stored = h.tokens.get(&account.id, "user1", Platform::Twitter).await.unwrap();
    assert_eq!(stored.access_token, "access-2");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
    assert!(stored.expires_at.is_some_and(|at| at > Utc::now() + Duration::seconds(3600)));

    // Disconnect revokes once and is idempotent.
    assert!(h.manager.disconnect(&account.id, "user1", Platform::Twitter).await.unwrap());
    assert!(!h.manager.disconnect(&account.id, "user1", Platform::Twitter).await.unwrap());
    assert_eq!(h.adapter.revoke_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reconnect_updates_in_place() {
    let h = harness();

    let first = {
        let auth = h.manager.init(Platform::Twitter, "user1").await.unwrap();
        h.manager.callback(Platform::Twitter, "user1", "auth-code-1", &auth.state).await.unwrap()
    };
    let second = {
        let auth = h.manager.init(Platform::Twitter, "user1").await.unwrap();
        h.manager.callback(Platform::Twitter, "user1", "auth-code-1", &auth.state).await.unwrap()
    };

    assert_eq!(first.id, second.id);
    assert_eq!(h.manager.list_accounts("user1", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn callback_with_foreign_state_stores_nothing() {
    let h = harness();

    let auth = h.manager.init(Platform::Twitter, "user1").await.unwrap();
    let result =
        h.manager.callback(Platform::Twitter, "intruder", "auth-code-1", &auth.state).await;

    assert!(matches!(result, Err(SyndioError::UserMismatch)));
    assert!(h.manager.list_accounts("user1", None).await.unwrap().is_empty());
    assert!(h.manager.list_accounts("intruder", None).await.unwrap().is_empty());

    // The state was consumed by the failed attempt; the real user cannot
    // finish the flow with it either.
    let replay = h.manager.callback(Platform::Twitter, "user1", "auth-code-1", &auth.state).await;
    assert!(matches!(replay, Err(SyndioError::InvalidState)));
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_state_consume_has_one_winner() {
    let h = harness();

    let state = h.states.create(Platform::Twitter, "user1", "verifier").await.unwrap();

    let a = {
        let states = h.states.clone();
        let state = state.clone();
        tokio::spawn(async move { states.consume(&state, Platform::Twitter).await })
    };
    let b = {
        let states = h.states.clone();
        let state = state.clone();
        tokio::spawn(async move { states.consume(&state, Platform::Twitter).await })
    };

    let outcomes = [a.await.unwrap(), b.await.unwrap()];
    let wins = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(SyndioError::InvalidState))));
}

#[tokio::test]
async fn accounts_are_isolated_between_users() {
    let h = harness();

    let auth = h.manager.init(Platform::Twitter, "user1").await.unwrap();
    let account =
        h.manager.callback(Platform::Twitter, "user1", "auth-code-1", &auth.state).await.unwrap();

    let stolen = h.manager.get_valid_token(&account.id, "user2", Platform::Twitter).await;
    assert!(matches!(stolen, Err(SyndioError::NotFound(_))));

    assert!(!h.manager.disconnect(&account.id, "user2", Platform::Twitter).await.unwrap());
    assert_eq!(h.manager.list_accounts("user1", None).await.unwrap().len(), 1);
}
