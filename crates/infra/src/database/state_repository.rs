//! CSRF state repository
//!
//! Single-use, TTL-bound state tokens. Consume is a single
//! `DELETE ... RETURNING` statement so two concurrent callbacks with the
//! same state race on the row itself and exactly one wins.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::params;
use syndio_core::connection::pkce::generate_state_token;
use syndio_core::StateStore;
use syndio_domain::{ConsumedState, Platform, Result, SyndioError, STATE_TTL_SECONDS};
use tokio::task;
use tracing::debug;

use super::{map_join_error, map_sql_error, DbManager};

/// SQLite-backed implementation of [`StateStore`].
pub struct SqliteStateStore {
    db: Arc<DbManager>,
}

impl SqliteStateStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn create(
        &self,
        platform: Platform,
        user_id: &str,
        code_verifier: &str,
    ) -> Result<String> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let code_verifier = code_verifier.to_string();
        let state = generate_state_token();
        let state_out = state.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let now = Utc::now().timestamp();
            conn.execute(
                "INSERT INTO oauth_states (state, platform, user_id, code_verifier, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    &state,
                    platform.as_str(),
                    &user_id,
                    &code_verifier,
                    now,
                    now + STATE_TTL_SECONDS
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)??;

        Ok(state_out)
    }

    async fn consume(&self, state: &str, platform: Platform) -> Result<ConsumedState> {
        let db = Arc::clone(&self.db);
        let state = state.to_string();

        task::spawn_blocking(move || -> Result<ConsumedState> {
            let conn = db.get_connection()?;

            // The row is gone after this whatever the outcome; an expired
            // state is still unusable for replay.
            let result = conn.query_row(
                "DELETE FROM oauth_states
                 WHERE state = ?1 AND platform = ?2
                 RETURNING user_id, code_verifier, expires_at",
                params![&state, platform.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            );

            match result {
                Ok((user_id, code_verifier, expires_at)) => {
                    if expires_at < Utc::now().timestamp() {
                        return Err(SyndioError::StateExpired);
                    }
                    Ok(ConsumedState { user_id, code_verifier })
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => Err(SyndioError::InvalidState),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn purge_expired(&self) -> Result<usize> {
        let db = Arc::clone(&self.db);

        let purged = task::spawn_blocking(move || -> Result<usize> {
            let conn = db.get_connection()?;
            conn.execute(
                "DELETE FROM oauth_states WHERE expires_at < ?1",
                params![Utc::now().timestamp()],
            )
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)??;

        if purged > 0 {
            debug!(purged, "expired oauth states removed");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn store() -> (SqliteStateStore, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db =
            Arc::new(DbManager::new(temp_dir.path().join("test.db"), 4).expect("manager created"));
        db.run_migrations().expect("migrations run");
        (SqliteStateStore::new(db), temp_dir)
    }

    #[tokio::test]
    async fn consume_returns_user_and_verifier() {
        let (store, _guard) = store();

        let state = store.create(Platform::Twitter, "user1", "verifier123").await.unwrap();
        let consumed = store.consume(&state, Platform::Twitter).await.unwrap();

        assert_eq!(consumed.user_id, "user1");
        assert_eq!(consumed.code_verifier, "verifier123");
    }

    #[tokio::test]
    async fn consume_is_single_use() {
        let (store, _guard) = store();

        let state = store.create(Platform::LinkedIn, "user1", "").await.unwrap();
        store.consume(&state, Platform::LinkedIn).await.unwrap();

        let replay = store.consume(&state, Platform::LinkedIn).await;
        assert!(matches!(replay, Err(SyndioError::InvalidState)));
    }

    #[tokio::test]
    async fn consume_rejects_platform_mismatch() {
        let (store, _guard) = store();

        let state = store.create(Platform::Twitter, "user1", "").await.unwrap();
        let result = store.consume(&state, Platform::Facebook).await;

        assert!(matches!(result, Err(SyndioError::InvalidState)));
    }

    #[tokio::test]
    async fn consume_rejects_unknown_state() {
        let (store, _guard) = store();

        let result = store.consume("never-issued", Platform::Twitter).await;
        assert!(matches!(result, Err(SyndioError::InvalidState)));
    }

    #[tokio::test]
    async fn expired_state_is_rejected_and_deleted() {
        let (store, _guard) = store();

        let state = store.create(Platform::YouTube, "user1", "").await.unwrap();
        {
            let conn = store.db.get_connection().unwrap();
            conn.execute(
                "UPDATE oauth_states SET expires_at = ?1 WHERE state = ?2",
                params![Utc::now().timestamp() - 1, &state],
            )
            .unwrap();
        }

        let first = store.consume(&state, Platform::YouTube).await;
        assert!(matches!(first, Err(SyndioError::StateExpired)));

        // The expired row was deleted on the failed consume.
        let second = store.consume(&state, Platform::YouTube).await;
        assert!(matches!(second, Err(SyndioError::InvalidState)));
    }

    #[tokio::test]
    async fn purge_removes_only_expired_rows() {
        let (store, _guard) = store();

        let live = store.create(Platform::Twitter, "user1", "").await.unwrap();
        let dead = store.create(Platform::Twitter, "user1", "").await.unwrap();
        {
            let conn = store.db.get_connection().unwrap();
            conn.execute(
                "UPDATE oauth_states SET expires_at = ?1 WHERE state = ?2",
                params![Utc::now().timestamp() - 1, &dead],
            )
            .unwrap();
        }

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.consume(&live, Platform::Twitter).await.is_ok());
    }
}
