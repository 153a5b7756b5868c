//! Patreon adapter
//!
//! Standard OAuth2 with rotating refresh tokens (~1 month access tokens).
//! Identity comes from the v2 identity endpoint, which wraps everything in
//! a JSON:API envelope.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use syndio_core::PlatformAdapter;
use syndio_domain::{Platform, RemoteIdentity, Result, SyndioError, TokenGrant};

use super::oauth2::{build_url, to_metadata, ProviderEndpoints, TokenResponse};
use super::OAuthApp;
use crate::http::OAuthHttp;

const SCOPES: &str = "identity campaigns w:campaigns.webhook";

pub struct PatreonAdapter {
    app: OAuthApp,
    http: OAuthHttp,
    endpoints: ProviderEndpoints,
}

impl PatreonAdapter {
    #[must_use]
    pub fn new(app: OAuthApp, http: OAuthHttp) -> Self {
        Self::with_endpoints(
            app,
            http,
            ProviderEndpoints {
                authorize: "https://www.patreon.com/oauth2/authorize".into(),
                token: "https://www.patreon.com/api/oauth2/token".into(),
                identity: "https://www.patreon.com/api/oauth2/v2/identity".into(),
                long_lived: None,
                refresh: None,
                revoke: None,
            },
        )
    }

    #[must_use]
    pub fn with_endpoints(app: OAuthApp, http: OAuthHttp, endpoints: ProviderEndpoints) -> Self {
        Self { app, http, endpoints }
    }
}

#[async_trait]
impl PlatformAdapter for PatreonAdapter {
    fn platform(&self) -> Platform {
        Platform::Patreon
    }

    fn build_authorize_url(&self, state: &str, _code_challenge: Option<&str>) -> Result<String> {
        build_url(
            &self.endpoints.authorize,
            &[
                ("response_type", "code"),
                ("client_id", &self.app.client_id),
                ("redirect_uri", &self.app.redirect_uri),
                ("scope", SCOPES),
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
                    ("grant_type", "authorization_code"),
                    ("client_id", &self.app.client_id),
                    ("client_secret", self.app.secret()?),
                    ("redirect_uri", &self.app.redirect_uri),
                ],
            )
            .await
            .map_err(|failure| SyndioError::TokenExchangeFailed(failure.describe()))?;

        Ok(response.into_grant())
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<RemoteIdentity> {
        let url = build_url(&self.endpoints.identity, &[("fields[user]", "full_name,image_url")])?;

        let identity: IdentityResponse = self
            .http
            .get_json(&url, access_token)
            .await
            .map_err(|failure| SyndioError::IdentityFetchFailed(failure.describe()))?;

        let raw = to_metadata(&identity.data);
        Ok(RemoteIdentity {
            platform_account_id: identity.data.id,
            username: identity.data.attributes.full_name,
            profile_picture_url: identity.data.attributes.image_url,
            raw,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let response: TokenResponse = self
            .http
            .post_form(
                &self.endpoints.token,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                    ("client_id", &self.app.client_id),
                    ("client_secret", self.app.secret()?),
                ],
            )
            .await
            .map_err(|failure| SyndioError::RefreshFailed(failure.describe()))?;

        Ok(response.into_grant())
    }
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    data: UserResource,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserResource {
    id: String,
    attributes: UserAttributes,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserAttributes {
    full_name: String,
    #[serde(default)]
    image_url: Option<String>,
}
