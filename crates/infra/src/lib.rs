//! # Syndio Infrastructure
//!
//! Infrastructure layer - all I/O lives here.
//!
//! This crate contains:
//! - SQLite persistence for CSRF states and social accounts ([`database`])
//! - The shared OAuth HTTP client ([`http`])
//! - One [`adapters`] implementation per supported platform
//! - Environment and file based configuration loading ([`config`])
//!
//! ## Architecture Principles
//! - Implements the port traits from `syndio-core`
//! - Depends on `syndio-domain` and `syndio-core` only
//! - No business logic; orchestration stays in core

pub mod adapters;
pub mod config;
pub mod database;
pub mod http;

pub use adapters::{create_adapter, OAuthApp, ProviderEndpoints};
pub use database::{DbManager, SqliteStateStore, SqliteTokenStore};
pub use http::OAuthHttp;
