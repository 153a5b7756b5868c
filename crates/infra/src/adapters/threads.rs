//! Threads adapter
//!
//! Meta's Threads API. The code exchange yields a short-lived token that is
//! traded for a long-lived one (~60 days) via `th_exchange_token`. Threads
//! has no separate refresh token: the long-lived access token refreshes
//! itself through `th_refresh_token`, so the grant stores a copy of the
//! access token in the refresh slot and rotates it on every refresh.

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use syndio_core::PlatformAdapter;
use syndio_domain::{Platform, RemoteIdentity, Result, SyndioError, TokenGrant};

use super::oauth2::{build_url, to_metadata, ProviderEndpoints, TokenResponse};
use super::OAuthApp;
use crate::http::OAuthHttp;

const SCOPES: &str = "threads_basic,threads_content_publish";

pub struct ThreadsAdapter {
    app: OAuthApp,
    http: OAuthHttp,
    endpoints: ProviderEndpoints,
}

impl ThreadsAdapter {
    #[must_use]
    pub fn new(app: OAuthApp, http: OAuthHttp) -> Self {
        Self::with_endpoints(
            app,
            http,
            ProviderEndpoints {
                authorize: "https://threads.net/oauth/authorize".into(),
                token: "https://graph.threads.net/oauth/access_token".into(),
                identity: "https://graph.threads.net/v1.0/me".into(),
                long_lived: Some("https://graph.threads.net/access_token".into()),
                refresh: Some("https://graph.threads.net/refresh_access_token".into()),
                revoke: None,
            },
        )
    }

    #[must_use]
    pub fn with_endpoints(app: OAuthApp, http: OAuthHttp, endpoints: ProviderEndpoints) -> Self {
        Self { app, http, endpoints }
    }

    async fn exchange_long_lived(&self, short_lived: &str) -> Result<TokenResponse> {
        let Some(long_lived) = &self.endpoints.long_lived else {
            return Err(SyndioError::Config("long-lived exchange endpoint missing".into()));
        };

        let url = build_url(
            long_lived,
            &[
                ("grant_type", "th_exchange_token"),
                ("client_secret", self.app.secret()?),
                ("access_token", short_lived),
            ],
        )?;

        self.http
            .get_json_unauthenticated(&url)
            .await
            .map_err(|failure| SyndioError::TokenExchangeFailed(failure.describe()))
    }
}

#[async_trait]
impl PlatformAdapter for ThreadsAdapter {
    fn platform(&self) -> Platform {
        Platform::Threads
    }

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
                ("response_type", "code"),
                ("state", state),
            ],
        )
    }

    async fn exchange_code(&self, code: &str, _code_verifier: Option<&str>) -> Result<TokenGrant> {
        let short_lived: TokenResponse = self
            .http
            .post_form(
                &self.endpoints.token,
                &[
                    ("client_id", &self.app.client_id),
                    ("client_secret", self.app.secret()?),
                    ("grant_type", "authorization_code"),
                    ("redirect_uri", &self.app.redirect_uri),
                    ("code", code),
                ],
            )
            .await
            .map_err(|failure| SyndioError::TokenExchangeFailed(failure.describe()))?;

        let long_lived = self.exchange_long_lived(&short_lived.access_token).await?;

        // The access token doubles as the refresh credential.
        Ok(TokenGrant {
            refresh_token: Some(long_lived.access_token.clone()),
            access_token: long_lived.access_token,
            expires_in: long_lived.expires_in,
        })
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<RemoteIdentity> {
        let url = build_url(
            &self.endpoints.identity,
            &[("fields", "id,username,threads_profile_picture_url")],
        )?;

        let user: User = self
            .http
            .get_json(&url, access_token)
            .await
            .map_err(|failure| SyndioError::IdentityFetchFailed(failure.describe()))?;

        let raw = to_metadata(&user);
        Ok(RemoteIdentity {
            platform_account_id: user.id,
            username: user.username,
            profile_picture_url: user.threads_profile_picture_url,
            raw,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let Some(refresh) = &self.endpoints.refresh else {
            return Err(SyndioError::RefreshUnsupported);
        };

        let url = build_url(
            refresh,
            &[("grant_type", "th_refresh_token"), ("access_token", refresh_token)],
        )?;

        let response: TokenResponse = self
            .http
            .get_json_unauthenticated(&url)
            .await
            .map_err(|failure| SyndioError::RefreshFailed(failure.describe()))?;

        Ok(TokenGrant {
            refresh_token: Some(response.access_token.clone()),
            access_token: response.access_token,
            expires_in: response.expires_in,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: String,
    username: String,
    #[serde(default)]
    threads_profile_picture_url: Option<String>,
}
