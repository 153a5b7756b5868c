//! YouTube adapter
//!
//! Google OAuth2. `access_type=offline` plus `prompt=consent` forces a
//! refresh token on every connect; Google does not rotate it on refresh.
//! Identity resolves the user's own channel through the Data API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use syndio_core::PlatformAdapter;
use syndio_domain::{Platform, RemoteIdentity, Result, SyndioError, TokenGrant};

use super::oauth2::{build_url, to_metadata, ProviderEndpoints, TokenResponse};
use super::OAuthApp;
use crate::http::OAuthHttp;

const SCOPES: &str = "https://www.googleapis.com/auth/youtube.upload \
https://www.googleapis.com/auth/youtube.readonly";

pub struct YoutubeAdapter {
    app: OAuthApp,
    http: OAuthHttp,
    endpoints: ProviderEndpoints,
}

impl YoutubeAdapter {
    #[must_use]
    pub fn new(app: OAuthApp, http: OAuthHttp) -> Self {
        Self::with_endpoints(
            app,
            http,
            ProviderEndpoints {
                authorize: "https://accounts.google.com/o/oauth2/v2/auth".into(),
                token: "https://oauth2.googleapis.com/token".into(),
                identity: "https://www.googleapis.com/youtube/v3/channels".into(),
                long_lived: None,
                refresh: None,
                revoke: Some("https://oauth2.googleapis.com/revoke".into()),
            },
        )
    }

    #[must_use]
    pub fn with_endpoints(app: OAuthApp, http: OAuthHttp, endpoints: ProviderEndpoints) -> Self {
        Self { app, http, endpoints }
    }
}

#[async_trait]
impl PlatformAdapter for YoutubeAdapter {
    fn platform(&self) -> Platform {
        Platform::YouTube
    }

    fn build_authorize_url(&self, state: &str, _code_challenge: Option<&str>) -> Result<String> {
        build_url(
            &self.endpoints.authorize,
            &[
                ("client_id", &self.app.client_id),
                ("redirect_uri", &self.app.redirect_uri),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
    }

    async fn exchange_code(&self, code: &str, _code_verifier: Option<&str>) -> Result<TokenGrant> {
        let response: TokenResponse = self
            .http
            .post_form(
                &self.endpoints.token,
                &[
                    ("code", code),
                    ("client_id", &self.app.client_id),
                    ("client_secret", self.app.secret()?),
                    ("redirect_uri", &self.app.redirect_uri),
                    ("grant_type", "authorization_code"),
                ],
            )
            .await
            .map_err(|failure| SyndioError::TokenExchangeFailed(failure.describe()))?;

        Ok(response.into_grant())
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<RemoteIdentity> {
        let url = build_url(&self.endpoints.identity, &[("part", "snippet"), ("mine", "true")])?;

        let channels: ChannelList = self
            .http
            .get_json(&url, access_token)
            .await
            .map_err(|failure| SyndioError::IdentityFetchFailed(failure.describe()))?;

        let channel = channels.items.into_iter().next().ok_or_else(|| {
            SyndioError::IdentityFetchFailed("account has no youtube channel".into())
        })?;

        let raw = to_metadata(&channel);
        let profile_picture_url =
            channel.snippet.thumbnails.and_then(|t| t.default).map(|d| d.url);
        Ok(RemoteIdentity {
            platform_account_id: channel.id,
            username: channel.snippet.title,
            profile_picture_url,
            raw,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let response: TokenResponse = self
            .http
            .post_form(
                &self.endpoints.token,
                &[
                    ("client_id", &self.app.client_id),
                    ("client_secret", self.app.secret()?),
                    ("refresh_token", refresh_token),
                    ("grant_type", "refresh_token"),
                ],
            )
            .await
            .map_err(|failure| SyndioError::RefreshFailed(failure.describe()))?;

        Ok(response.into_grant())
    }

    async fn revoke(&self, access_token: &str) -> Result<()> {
        let Some(revoke) = &self.endpoints.revoke else { return Ok(()) };
        self.http
            .post_discard(revoke, &[("token", access_token)])
            .await
            .map_err(|failure| SyndioError::Network(failure.describe()))
    }
}

#[derive(Debug, Deserialize)]
struct ChannelList {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Channel {
    id: String,
    snippet: Snippet,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    default: Option<Thumbnail>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Thumbnail {
    url: String,
}

#[cfg(test)]
mod tests {
    use syndio_domain::HttpConfig;

    use super::*;

    fn adapter() -> YoutubeAdapter {
        YoutubeAdapter::new(
            OAuthApp {
                client_id: "cid".into(),
                client_secret: Some("csecret".into()),
                redirect_uri: "https://app.test/callback/youtube".into(),
            },
            OAuthHttp::new(&HttpConfig::default()).unwrap(),
        )
    }

    #[test]
    fn authorize_url_forces_offline_consent() {
        let url = adapter().build_authorize_url("state123", None).unwrap();
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn channel_list_parses_data_api_shape() {
        let channels: ChannelList = serde_json::from_str(
            r#"{"items":[{"id":"UC123","snippet":{"title":"Syndio Clips","thumbnails":{"default":{"url":"https://yt.test/t.jpg"}}}}]}"#,
        )
        .unwrap();
        assert_eq!(channels.items.len(), 1);
        assert_eq!(channels.items[0].snippet.title, "Syndio Clips");
    }

    #[test]
    fn empty_channel_list_parses() {
        let channels: ChannelList = serde_json::from_str("{}").unwrap();
        assert!(channels.items.is_empty());
    }
}
