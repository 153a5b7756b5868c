//! SQLite persistence
//!
//! All columns use unix-second INTEGER timestamps and TEXT JSON blobs.
//! Repositories run their rusqlite calls on the blocking thread pool and
//! surface failures as [`SyndioError::Database`].

mod account_repository;
mod manager;
mod state_repository;

pub use account_repository::SqliteTokenStore;
pub use manager::DbManager;
pub use state_repository::SqliteStateStore;

use chrono::{DateTime, Utc};
use syndio_domain::SyndioError;

pub(crate) fn map_sql_error(err: rusqlite::Error) -> SyndioError {
    SyndioError::Database(err.to_string())
}

pub(crate) fn map_pool_error(err: r2d2::Error) -> SyndioError {
    SyndioError::Database(format!("connection pool: {err}"))
}

pub(crate) fn map_join_error(err: tokio::task::JoinError) -> SyndioError {
    SyndioError::Internal(format!("blocking task join failed: {err}"))
}

/// Decode a unix-seconds column; out-of-range values are data corruption.
pub(crate) fn parse_unix(secs: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(0, secs)
    })
}
