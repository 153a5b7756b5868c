//! Core connection-lifecycle types
//!
//! Unified data structures shared by the connection manager, the stores,
//! and the platform adapters.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SyndioError;

/// Default TTL for CSRF state rows (10 minutes).
pub const STATE_TTL_SECONDS: i64 = 600;

/// Supported social platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    LinkedIn,
    Twitter,
    Threads,
    YouTube,
    Patreon,
}

impl Platform {
    /// All platforms, in a stable order.
    pub const ALL: [Platform; 7] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::LinkedIn,
        Platform::Twitter,
        Platform::Threads,
        Platform::YouTube,
        Platform::Patreon,
    ];

    /// Canonical lowercase identifier used in storage and URLs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::LinkedIn => "linkedin",
            Platform::Twitter => "twitter",
            Platform::Threads => "threads",
            Platform::YouTube => "youtube",
            Platform::Patreon => "patreon",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = SyndioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "linkedin" => Ok(Platform::LinkedIn),
            "twitter" | "x" => Ok(Platform::Twitter),
            "threads" => Ok(Platform::Threads),
            "youtube" => Ok(Platform::YouTube),
            "patreon" => Ok(Platform::Patreon),
            other => Err(SyndioError::InvalidInput(format!("unknown platform: {other}"))),
        }
    }
}

/// A connected social account with its stored credentials.
///
/// One row per `(user_id, platform, platform_account_id)`; reconnecting the
/// same external account updates the row in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialAccount {
    /// Internal identifier (UUIDv7).
    pub id: String,

    /// Owning Syndio user.
    pub user_id: String,

    pub platform: Platform,

    /// The provider-side account id (numeric string for most platforms,
    /// URN-ish for LinkedIn).
    pub platform_account_id: String,

    pub username: String,

    pub profile_picture_url: Option<String>,

    pub access_token: String,

    /// Absent for platforms that issue page/long-lived tokens with no
    /// refresh concept.
    pub refresh_token: Option<String>,

    /// `None` means the token is treated as non-expiring.
    pub expires_at: Option<DateTime<Utc>>,

    /// Platform-specific extras (page lists, campaign info, business
    /// account ids) kept as a free-form JSON bag.
    pub metadata: serde_json::Value,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialAccount {
    /// Check whether the access token is at or inside the refresh buffer.
    ///
    /// Returns `false` for non-expiring tokens. The boundary is inclusive:
    /// when exactly `buffer` remains before expiry, a refresh triggers.
    #[must_use]
    pub fn needs_refresh(&self, buffer: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + buffer >= expires_at,
            None => false,
        }
    }
}

/// Fields required to create-or-update a [`SocialAccount`].
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: String,
    pub platform: Platform,
    pub platform_account_id: String,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

/// Tokens returned by a provider's token endpoint (exchange or refresh).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token lifetime in seconds; `None` for non-expiring grants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Compute the absolute expiry timestamp from `expires_in`.
    ///
    /// `None` (or a non-positive lifetime) means the grant never expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_in.filter(|secs| *secs > 0).map(|secs| Utc::now() + Duration::seconds(secs))
    }
}

/// The provider-side identity behind an access token.
#[derive(Debug, Clone)]
pub struct RemoteIdentity {
    pub platform_account_id: String,
    pub username: String,
    pub profile_picture_url: Option<String>,
    /// Raw provider payload, stored as account metadata.
    pub raw: serde_json::Value,
}

/// Payload recovered when a CSRF state token is consumed.
#[derive(Debug, Clone)]
pub struct ConsumedState {
    pub user_id: String,
    /// Empty when the platform does not use PKCE.
    pub code_verifier: String,
}

/// Result of starting a connect flow: where to send the user's browser.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationRequest {
    pub auth_url: String,
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips_through_str() {
        for platform in Platform::ALL {
            let parsed: Platform = platform.as_str().parse().unwrap();
            assert_eq!(parsed, platform);
        }
    }

    #[test]
    fn platform_accepts_x_alias() {
        let parsed: Platform = "X".parse().unwrap();
        assert_eq!(parsed, Platform::Twitter);
    }

    #[test]
    fn platform_rejects_unknown() {
        let result = "myspace".parse::<Platform>();
        assert!(matches!(result, Err(SyndioError::InvalidInput(_))));
    }

    #[test]
    fn token_grant_computes_expiry() {
        let grant = TokenGrant {
            access_token: "at".into(),
            refresh_token: None,
            expires_in: Some(7200),
        };

        let expires_at = grant.expires_at().unwrap();
        let remaining = (expires_at - Utc::now()).num_seconds();
        assert!(remaining > 7190 && remaining <= 7200);
    }

    #[test]
    fn token_grant_without_lifetime_never_expires() {
        let grant =
            TokenGrant { access_token: "at".into(), refresh_token: None, expires_in: None };
        assert!(grant.expires_at().is_none());

        let zero =
            TokenGrant { access_token: "at".into(), refresh_token: None, expires_in: Some(0) };
        assert!(zero.expires_at().is_none());
    }

    fn account_expiring_in(secs: i64) -> SocialAccount {
        let now = Utc::now();
        SocialAccount {
            id: "acct".into(),
            user_id: "u1".into(),
            platform: Platform::Twitter,
            platform_account_id: "42".into(),
            username: "alice".into(),
            profile_picture_url: None,
            access_token: "AT".into(),
            refresh_token: Some("RT".into()),
            expires_at: Some(now + Duration::seconds(secs)),
            metadata: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn fresh_token_outside_buffer_does_not_refresh() {
        let account = account_expiring_in(7200);
        assert!(!account.needs_refresh(Duration::seconds(300)));
    }

    #[test]
    fn token_inside_buffer_refreshes() {
        let account = account_expiring_in(120);
        assert!(account.needs_refresh(Duration::seconds(300)));
    }

    #[test]
    fn non_expiring_token_never_refreshes() {
        let mut account = account_expiring_in(0);
        account.expires_at = None;
        assert!(!account.needs_refresh(Duration::seconds(300)));
    }
}
