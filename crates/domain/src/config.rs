//! Configuration structures
//!
//! Deserialized from environment variables or a JSON/TOML file by the
//! infra config loader.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// SQLite database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path.
    pub path: String,
    /// Connection pool size.
    pub pool_size: u32,
}

/// Outbound HTTP client settings for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds. Every provider call carries this
    /// explicitly; a timed-out exchange or refresh surfaces as the
    /// corresponding typed failure.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Extra attempts for idempotent reads (identity fetches). Token
    /// exchanges and refreshes are never retried.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base delay between retry attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    1
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// OAuth application credentials for a single platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub client_id: String,
    /// Absent for public PKCE-only clients.
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.retry_delay_ms, 500);
    }

    #[test]
    fn config_deserializes_without_http_section() {
        let json = r#"{"database": {"path": "test.db", "pool_size": 4}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.http.timeout_seconds, 30);
    }
}
