//! Social account repository
//!
//! Upserts on the `(user_id, platform, platform_account_id)` uniqueness
//! triple so reconnecting an external account updates the existing row and
//! keeps its internal id stable.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use syndio_core::TokenStore;
use syndio_domain::{NewAccount, Platform, Result, SocialAccount, SyndioError};
use tokio::task;

use super::{map_join_error, map_sql_error, parse_unix, DbManager};

const ACCOUNT_COLUMNS: &str = "id, user_id, platform, platform_account_id, username, \
     profile_picture_url, access_token, refresh_token, expires_at, metadata, \
     created_at, updated_at";

/// SQLite-backed implementation of [`TokenStore`].
pub struct SqliteTokenStore {
    db: Arc<DbManager>,
}

impl SqliteTokenStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn upsert(&self, account: NewAccount) -> Result<String> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<String> {
            let conn = db.get_connection()?;
            let now = Utc::now().timestamp();
            let metadata = account.metadata.to_string();

            conn.execute(
                "INSERT INTO social_accounts (
                    id, user_id, platform, platform_account_id, username,
                    profile_picture_url, access_token, refresh_token, expires_at,
                    metadata, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                 ON CONFLICT (user_id, platform, platform_account_id) DO UPDATE SET
                    username = excluded.username,
                    profile_picture_url = excluded.profile_picture_url,
                    access_token = excluded.access_token,
                    refresh_token = excluded.refresh_token,
                    expires_at = excluded.expires_at,
                    metadata = excluded.metadata,
                    updated_at = excluded.updated_at",
                params![
                    uuid::Uuid::now_v7().to_string(),
                    &account.user_id,
                    account.platform.as_str(),
                    &account.platform_account_id,
                    &account.username,
                    &account.profile_picture_url,
                    &account.access_token,
                    &account.refresh_token,
                    account.expires_at.map(|at| at.timestamp()),
                    &metadata,
                    now,
                    now
                ],
            )
            .map_err(map_sql_error)?;

            // On conflict the existing row kept its id; read it back.
            conn.query_row(
                "SELECT id FROM social_accounts
                 WHERE user_id = ?1 AND platform = ?2 AND platform_account_id = ?3",
                params![&account.user_id, account.platform.as_str(), &account.platform_account_id],
                |row| row.get(0),
            )
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get(
        &self,
        account_id: &str,
        user_id: &str,
        platform: Platform,
    ) -> Result<SocialAccount> {
        let db = Arc::clone(&self.db);
        let account_id = account_id.to_string();
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<SocialAccount> {
            let conn = db.get_connection()?;

            let result = conn.query_row(
                &format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM social_accounts
                     WHERE id = ?1 AND user_id = ?2 AND platform = ?3"
                ),
                params![&account_id, &user_id, platform.as_str()],
                map_account_row,
            );

            match result {
                Ok(account) => Ok(account),
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    Err(SyndioError::NotFound("social account".into()))
                }
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_user(
        &self,
        user_id: &str,
        platform: Option<Platform>,
    ) -> Result<Vec<SocialAccount>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<SocialAccount>> {
            let conn = db.get_connection()?;

            let mut accounts = Vec::new();
            match platform {
                Some(platform) => {
                    let mut stmt = conn
                        .prepare(&format!(
                            "SELECT {ACCOUNT_COLUMNS} FROM social_accounts
                             WHERE user_id = ?1 AND platform = ?2
                             ORDER BY created_at ASC"
                        ))
                        .map_err(map_sql_error)?;
                    let rows = stmt
                        .query_map(params![&user_id, platform.as_str()], map_account_row)
                        .map_err(map_sql_error)?;
                    for row in rows {
                        accounts.push(row.map_err(map_sql_error)?);
                    }
                }
                None => {
                    let mut stmt = conn
                        .prepare(&format!(
                            "SELECT {ACCOUNT_COLUMNS} FROM social_accounts
                             WHERE user_id = ?1
                             ORDER BY created_at ASC"
                        ))
                        .map_err(map_sql_error)?;
                    let rows = stmt
                        .query_map(params![&user_id], map_account_row)
                        .map_err(map_sql_error)?;
                    for row in rows {
                        accounts.push(row.map_err(map_sql_error)?);
                    }
                }
            }

            Ok(accounts)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_tokens(
        &self,
        account_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let db = Arc::clone(&self.db);
        let account_id = account_id.to_string();
        let access_token = access_token.to_string();
        let refresh_token = refresh_token.map(str::to_string);

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;

            // COALESCE keeps the stored refresh token for providers that do
            // not rotate it; expires_at is written as given, NULL included.
            let changed = conn
                .execute(
                    "UPDATE social_accounts SET
                        access_token = ?1,
                        refresh_token = COALESCE(?2, refresh_token),
                        expires_at = ?3,
                        updated_at = ?4
                     WHERE id = ?5",
                    params![
                        &access_token,
                        &refresh_token,
                        expires_at.map(|at| at.timestamp()),
                        Utc::now().timestamp(),
                        &account_id
                    ],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(SyndioError::NotFound("social account".into()));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, account_id: &str, user_id: &str, platform: Platform) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let account_id = account_id.to_string();
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let deleted = conn
                .execute(
                    "DELETE FROM social_accounts
                     WHERE id = ?1 AND user_id = ?2 AND platform = ?3",
                    params![&account_id, &user_id, platform.as_str()],
                )
                .map_err(map_sql_error)?;
            Ok(deleted > 0)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_account_row(row: &Row<'_>) -> rusqlite::Result<SocialAccount> {
    let platform: String = row.get(2)?;
    let platform = platform.parse::<Platform>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(err))
    })?;

    let metadata: String = row.get(9)?;
    let metadata = serde_json::from_str(&metadata).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(err))
    })?;

    let expires_at = row.get::<_, Option<i64>>(8)?.map(parse_unix).transpose()?;

    Ok(SocialAccount {
        id: row.get(0)?,
        user_id: row.get(1)?,
        platform,
        platform_account_id: row.get(3)?,
        username: row.get(4)?,
        profile_picture_url: row.get(5)?,
        access_token: row.get(6)?,
        refresh_token: row.get(7)?,
        expires_at,
        metadata,
        created_at: parse_unix(row.get(10)?)?,
        updated_at: parse_unix(row.get(11)?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (SqliteTokenStore, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db =
            Arc::new(DbManager::new(temp_dir.path().join("test.db"), 4).expect("manager created"));
        db.run_migrations().expect("migrations run");
        (SqliteTokenStore::new(db), temp_dir)
    }

    fn new_account(user_id: &str, platform_account_id: &str) -> NewAccount {
        NewAccount {
            user_id: user_id.to_string(),
            platform: Platform::Twitter,
            platform_account_id: platform_account_id.to_string(),
            username: "alice".to_string(),
            profile_picture_url: Some("https://img.test/alice.png".to_string()),
            access_token: "AT1".to_string(),
            refresh_token: Some("RT1".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(2)),
            metadata: serde_json::json!({"id": platform_account_id}),
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let (store, _guard) = store();

        let id = store.upsert(new_account("user1", "42")).await.unwrap();
        let account = store.get(&id, "user1", Platform::Twitter).await.unwrap();

        assert_eq!(account.id, id);
        assert_eq!(account.username, "alice");
        assert_eq!(account.access_token, "AT1");
        assert_eq!(account.refresh_token.as_deref(), Some("RT1"));
        assert_eq!(account.metadata["id"], "42");
        assert!(account.expires_at.is_some());
    }

    #[tokio::test]
    async fn upsert_same_triple_keeps_id() {
        let (store, _guard) = store();

        let first = store.upsert(new_account("user1", "42")).await.unwrap();

        let mut again = new_account("user1", "42");
        again.username = "alice_renamed".to_string();
        again.access_token = "AT2".to_string();
        let second = store.upsert(again).await.unwrap();

        assert_eq!(first, second);
        let account = store.get(&first, "user1", Platform::Twitter).await.unwrap();
        assert_eq!(account.username, "alice_renamed");
        assert_eq!(account.access_token, "AT2");

        let accounts = store.get_by_user("user1", Some(Platform::Twitter)).await.unwrap();
        assert_eq!(accounts.len(), 1);
    }

    #[tokio::test]
    async fn distinct_external_accounts_coexist() {
        let (store, _guard) = store();

        store.upsert(new_account("user1", "42")).await.unwrap();
        store.upsert(new_account("user1", "43")).await.unwrap();

        let accounts = store.get_by_user("user1", Some(Platform::Twitter)).await.unwrap();
        assert_eq!(accounts.len(), 2);
    }

    #[tokio::test]
    async fn get_enforces_ownership() {
        let (store, _guard) = store();

        let id = store.upsert(new_account("user1", "42")).await.unwrap();

        let wrong_user = store.get(&id, "user2", Platform::Twitter).await;
        assert!(matches!(wrong_user, Err(SyndioError::NotFound(_))));

        let wrong_platform = store.get(&id, "user1", Platform::Facebook).await;
        assert!(matches!(wrong_platform, Err(SyndioError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_tokens_keeps_refresh_token_when_absent() {
        let (store, _guard) = store();

        let id = store.upsert(new_account("user1", "42")).await.unwrap();
        store.update_tokens(&id, "AT2", None, None).await.unwrap();

        let account = store.get(&id, "user1", Platform::Twitter).await.unwrap();
        assert_eq!(account.access_token, "AT2");
        assert_eq!(account.refresh_token.as_deref(), Some("RT1"));
        assert!(account.expires_at.is_none());
    }

    #[tokio::test]
    async fn update_tokens_rotates_when_present() {
        let (store, _guard) = store();

        let id = store.upsert(new_account("user1", "42")).await.unwrap();
        let expires = Utc::now() + Duration::hours(1);
        store.update_tokens(&id, "AT2", Some("RT2"), Some(expires)).await.unwrap();

        let account = store.get(&id, "user1", Platform::Twitter).await.unwrap();
        assert_eq!(account.refresh_token.as_deref(), Some("RT2"));
        assert_eq!(account.expires_at.map(|at| at.timestamp()), Some(expires.timestamp()));
    }

    #[tokio::test]
    async fn update_tokens_unknown_account_is_not_found() {
        let (store, _guard) = store();

        let result = store.update_tokens("missing", "AT", None, None).await;
        assert!(matches!(result, Err(SyndioError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_scoped_and_idempotent() {
        let (store, _guard) = store();

        let id = store.upsert(new_account("user1", "42")).await.unwrap();

        assert!(!store.delete(&id, "user2", Platform::Twitter).await.unwrap());
        assert!(store.delete(&id, "user1", Platform::Twitter).await.unwrap());
        assert!(!store.delete(&id, "user1", Platform::Twitter).await.unwrap());
    }
}
