//! Facebook adapter
//!
//! Graph API v21.0. The code exchange yields a short-lived user token which
//! is immediately traded for a long-lived one (~60 days) via
//! `fb_exchange_token`. Facebook has no refresh endpoint: once the
//! long-lived token lapses the user reconnects.

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use syndio_core::PlatformAdapter;
use syndio_domain::{Platform, RemoteIdentity, Result, SyndioError, TokenGrant};

use super::oauth2::{build_url, to_metadata, ProviderEndpoints, TokenResponse};
use super::OAuthApp;
use crate::http::OAuthHttp;

const SCOPES: &str = "pages_show_list,pages_read_engagement,pages_manage_posts,\
pages_manage_metadata,business_management";

pub struct FacebookAdapter {
    app: OAuthApp,
    http: OAuthHttp,
    endpoints: ProviderEndpoints,
}

impl FacebookAdapter {
    #[must_use]
    pub fn new(app: OAuthApp, http: OAuthHttp) -> Self {
        Self::with_endpoints(
            app,
            http,
            ProviderEndpoints {
                authorize: "https://www.facebook.com/v21.0/dialog/oauth".into(),
                token: "https://graph.facebook.com/v21.0/oauth/access_token".into(),
                identity: "https://graph.facebook.com/v21.0/me".into(),
                long_lived: Some("https://graph.facebook.com/v21.0/oauth/access_token".into()),
                refresh: None,
                revoke: None,
            },
        )
    }

    #[must_use]
    pub fn with_endpoints(app: OAuthApp, http: OAuthHttp, endpoints: ProviderEndpoints) -> Self {
        Self { app, http, endpoints }
    }

    /// Trade a short-lived user token for a long-lived one.
    async fn exchange_long_lived(&self, short_lived: &str) -> Result<TokenResponse> {
        let Some(long_lived) = &self.endpoints.long_lived else {
            return Err(SyndioError::Config("long-lived exchange endpoint missing".into()));
        };

        let url = build_url(
            long_lived,
            &[
                ("grant_type", "fb_exchange_token"),
                ("client_id", &self.app.client_id),
                ("client_secret", self.app.secret()?),
                ("fb_exchange_token", short_lived),
            ],
        )?;

        self.http
            .get_json_unauthenticated(&url)
            .await
            .map_err(|failure| SyndioError::TokenExchangeFailed(failure.describe()))
    }
}

#[async_trait]
impl PlatformAdapter for FacebookAdapter {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    // Long-lived tokens; a wide buffer costs nothing and flags stale
    // accounts a day before they break.
    fn refresh_buffer(&self) -> Duration {
        Duration::hours(24)
    }

    fn build_authorize_url(&self, state: &str, _code_challenge: Option<&str>) -> Result<String> {
        build_url(
            &self.endpoints.authorize,
            &[
                ("client_id", &self.app.client_id),
                ("redirect_uri", &self.app.redirect_uri),
                ("scope", SCOPES),
                ("state", state),
                ("response_type", "code"),
            ],
        )
    }

    async fn exchange_code(&self, code: &str, _code_verifier: Option<&str>) -> Result<TokenGrant> {
        let url = build_url(
            &self.endpoints.token,
            &[
                ("client_id", &self.app.client_id),
                ("client_secret", self.app.secret()?),
                ("redirect_uri", &self.app.redirect_uri),
                ("code", code),
            ],
        )?;

        let short_lived: TokenResponse = self
            .http
            .get_json_unauthenticated(&url)
            .await
            .map_err(|failure| SyndioError::TokenExchangeFailed(failure.describe()))?;

        let long_lived = self.exchange_long_lived(&short_lived.access_token).await?;
        Ok(long_lived.into_grant())
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<RemoteIdentity> {
        let url = build_url(&self.endpoints.identity, &[("fields", "id,name,picture{url}")])?;

        let user: User = self
            .http
            .get_json(&url, access_token)
            .await
            .map_err(|failure| SyndioError::IdentityFetchFailed(failure.describe()))?;

        let raw = to_metadata(&user);
        Ok(RemoteIdentity {
            platform_account_id: user.id,
            username: user.name,
            profile_picture_url: user.picture.and_then(|p| p.data).map(|d| d.url),
            raw,
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant> {
        Err(SyndioError::RefreshUnsupported)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
    #[serde(default)]
    picture: Option<Picture>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Picture {
    #[serde(default)]
    data: Option<PictureData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PictureData {
    url: String,
}

#[cfg(test)]
mod tests {
    use syndio_domain::HttpConfig;

    use super::*;

    fn adapter() -> FacebookAdapter {
        FacebookAdapter::new(
            OAuthApp {
                client_id: "cid".into(),
                client_secret: Some("csecret".into()),
                redirect_uri: "https://app.test/callback/facebook".into(),
            },
            OAuthHttp::new(&HttpConfig::default()).unwrap(),
        )
    }

    #[test]
    fn authorize_url_has_page_scopes_and_no_pkce() {
        let url = adapter().build_authorize_url("state123", None).unwrap();
        assert!(url.contains("scope=pages_show_list"));
        assert!(url.contains("state=state123"));
        assert!(!url.contains("code_challenge"));
    }

    #[tokio::test]
    async fn refresh_is_unsupported() {
        let result = adapter().refresh("anything").await;
        assert!(matches!(result, Err(SyndioError::RefreshUnsupported)));
    }

    #[test]
    fn user_parses_with_and_without_picture() {
        let with: User = serde_json::from_str(
            r#"{"id":"10","name":"Page Owner","picture":{"data":{"url":"https://img.test/p"}}}"#,
        )
        .unwrap();
        assert!(with.picture.is_some());

        let without: User = serde_json::from_str(r#"{"id":"10","name":"Page Owner"}"#).unwrap();
        assert!(without.picture.is_none());
    }
}
