//! # Syndio Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The connection lifecycle state machine ([`ConnectionManager`])
//! - Port/adapter interfaces (traits) for storage and platform adapters
//! - PKCE and CSRF state-token generation
//!
//! ## Architecture Principles
//! - Only depends on `syndio-domain`
//! - No database or HTTP code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod connection;

// Re-export specific items to avoid ambiguity
pub use connection::manager::ConnectionManager;
pub use connection::pkce::PkceChallenge;
pub use connection::ports::{PlatformAdapter, StateStore, TokenStore};
