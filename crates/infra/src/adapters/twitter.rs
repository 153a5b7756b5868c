//! Twitter (X) adapter
//!
//! OAuth2 with mandatory PKCE (S256) and HTTP Basic credentials at the
//! token endpoint. Access tokens live two hours; `offline.access` grants a
//! rotating refresh token, so the refresh buffer is generous.

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use syndio_core::PlatformAdapter;
use syndio_domain::{Platform, RemoteIdentity, Result, SyndioError, TokenGrant};

use super::oauth2::{build_url, to_metadata, ProviderEndpoints, TokenResponse};
use super::OAuthApp;
use crate::http::OAuthHttp;

const SCOPES: &str = "tweet.read tweet.write users.read offline.access";

pub struct TwitterAdapter {
    app: OAuthApp,
    http: OAuthHttp,
    endpoints: ProviderEndpoints,
}

impl TwitterAdapter {
    #[must_use]
    pub fn new(app: OAuthApp, http: OAuthHttp) -> Self {
        Self::with_endpoints(
            app,
            http,
            ProviderEndpoints {
                authorize: "https://twitter.com/i/oauth2/authorize".into(),
                token: "https://api.twitter.com/2/oauth2/token".into(),
                identity: "https://api.twitter.com/2/users/me".into(),
                long_lived: None,
                refresh: None,
                revoke: Some("https://api.twitter.com/2/oauth2/revoke".into()),
            },
        )
    }

    #[must_use]
    pub fn with_endpoints(app: OAuthApp, http: OAuthHttp, endpoints: ProviderEndpoints) -> Self {
        Self { app, http, endpoints }
    }
}

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn uses_pkce(&self) -> bool {
        true
    }

    // Two-hour tokens; refresh well ahead of scheduled publishes.
    fn refresh_buffer(&self) -> Duration {
        Duration::seconds(900)
    }

    fn build_authorize_url(&self, state: &str, code_challenge: Option<&str>) -> Result<String> {
        let challenge = code_challenge
            .ok_or_else(|| SyndioError::InvalidInput("pkce code challenge required".into()))?;
        build_url(
            &self.endpoints.authorize,
            &[
                ("response_type", "code"),
                ("client_id", &self.app.client_id),
                ("redirect_uri", &self.app.redirect_uri),
                ("scope", SCOPES),
                ("state", state),
                ("code_challenge", challenge),
                ("code_challenge_method", "S256"),
            ],
        )
    }

    async fn exchange_code(&self, code: &str, code_verifier: Option<&str>) -> Result<TokenGrant> {
        let verifier = code_verifier
            .ok_or_else(|| SyndioError::InvalidInput("pkce code verifier required".into()))?;

        let response: TokenResponse = self
            .http
            .post_form_basic(
                &self.endpoints.token,
                &self.app.client_id,
                self.app.secret()?,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", &self.app.redirect_uri),
                    ("code_verifier", verifier),
                ],
            )
            .await
            .map_err(|failure| SyndioError::TokenExchangeFailed(failure.describe()))?;

        Ok(response.into_grant())
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<RemoteIdentity> {
        let url = build_url(&self.endpoints.identity, &[("user.fields", "profile_image_url")])?;

        let response: UserResponse = self
            .http
            .get_json(&url, access_token)
            .await
            .map_err(|failure| SyndioError::IdentityFetchFailed(failure.describe()))?;

        let raw = to_metadata(&response.data);
        Ok(RemoteIdentity {
            platform_account_id: response.data.id,
            username: response.data.username,
            profile_picture_url: response.data.profile_image_url,
            raw,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let response: TokenResponse = self
            .http
            .post_form_basic(
                &self.endpoints.token,
                &self.app.client_id,
                self.app.secret()?,
                &[("grant_type", "refresh_token"), ("refresh_token", refresh_token)],
            )
            .await
            .map_err(|failure| SyndioError::RefreshFailed(failure.describe()))?;

        Ok(response.into_grant())
    }

    async fn revoke(&self, access_token: &str) -> Result<()> {
        let Some(revoke) = &self.endpoints.revoke else { return Ok(()) };
        self.http
            .post_discard_basic(
                revoke,
                &self.app.client_id,
                self.app.secret()?,
                &[("token", access_token), ("token_type_hint", "access_token")],
            )
            .await
            .map_err(|failure| SyndioError::Network(failure.describe()))
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: User,
}

#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: String,
    username: String,
    #[serde(default)]
    profile_image_url: Option<String>,
}
