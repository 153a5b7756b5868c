//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SYNDIO_DB_PATH`: Database file path
//! - `SYNDIO_DB_POOL_SIZE`: Connection pool size
//! - `SYNDIO_HTTP_TIMEOUT_SECONDS`: Provider request timeout (optional)
//! - `SYNDIO_HTTP_RETRY_ATTEMPTS`: Extra tries for idempotent reads
//!   (optional)
//! - `SYNDIO_HTTP_RETRY_DELAY_MS`: Delay between retries (optional)
//!
//! Per-platform OAuth credentials use the platform name uppercased:
//! - `SYNDIO_<PLATFORM>_CLIENT_ID`
//! - `SYNDIO_<PLATFORM>_CLIENT_SECRET` (optional for public clients)
//! - `SYNDIO_<PLATFORM>_REDIRECT_URI`
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `syndio.{json,toml}` in the
//! working directory, up to two parent directories, and next to the
//! executable.

use std::path::{Path, PathBuf};

use syndio_domain::{Config, DatabaseConfig, HttpConfig, Platform, ProviderSettings, Result, SyndioError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SyndioError::Config` if configuration cannot be loaded from
/// either source.
pub fn load() -> Result<Config> {
    // A missing .env file is fine; variables may come from the real
    // environment.
    dotenvy::dotenv().ok();

    match load_from_env() {
        Ok(config) => {
            tracing::info!("configuration loaded from environment variables");
            Ok(config)
        }
        Err(err) => {
            tracing::debug!(error = ?err, "environment incomplete, trying config file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `SyndioError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("SYNDIO_DB_PATH")?;
    let db_pool_size = env_var("SYNDIO_DB_POOL_SIZE").and_then(|s| {
        s.parse::<u32>().map_err(|e| SyndioError::Config(format!("invalid pool size: {e}")))
    })?;

    let defaults = HttpConfig::default();
    let timeout_seconds = env_parse("SYNDIO_HTTP_TIMEOUT_SECONDS", defaults.timeout_seconds)?;
    let retry_attempts = env_parse("SYNDIO_HTTP_RETRY_ATTEMPTS", defaults.retry_attempts)?;
    let retry_delay_ms = env_parse("SYNDIO_HTTP_RETRY_DELAY_MS", defaults.retry_delay_ms)?;

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        http: HttpConfig { timeout_seconds, retry_attempts, retry_delay_ms },
    })
}

/// Load the OAuth application credentials for one platform from the
/// environment, e.g. `SYNDIO_TWITTER_CLIENT_ID`.
///
/// # Errors
/// Returns `SyndioError::Config` when the client id or redirect URI is
/// missing. The client secret is optional (public PKCE clients).
pub fn provider_from_env(platform: Platform) -> Result<ProviderSettings> {
    let prefix = format!("SYNDIO_{}", platform.as_str().to_uppercase());
    Ok(ProviderSettings {
        client_id: env_var(&format!("{prefix}_CLIENT_ID"))?,
        client_secret: std::env::var(format!("{prefix}_CLIENT_SECRET")).ok(),
        redirect_uri: env_var(&format!("{prefix}_REDIRECT_URI"))?,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SyndioError::Config` if no file is found or parsing fails.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyndioError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyndioError::Config("no config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyndioError::Config(format!("failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SyndioError::Config(format!("invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SyndioError::Config(format!("invalid JSON format: {e}"))),
        _ => Err(SyndioError::Config(format!("unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("syndio.json"),
            cwd.join("syndio.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("syndio.json"),
                exe_dir.join("syndio.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| SyndioError::Config(format!("missing required environment variable: {key}")))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| SyndioError::Config(format!("invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}
