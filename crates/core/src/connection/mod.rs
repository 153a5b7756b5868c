//! Social connection lifecycle
//!
//! The one structural pattern every platform integration shares: a CSRF
//! state round-trip, a code-for-token exchange, an identity lookup, and a
//! token that must be refreshed before it expires. The orchestration lives
//! in [`manager`]; everything platform- or storage-specific sits behind the
//! port traits in [`ports`].

pub mod manager;
pub mod pkce;
pub mod ports;
