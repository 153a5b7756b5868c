//! LinkedIn adapter
//!
//! Standard confidential-client OAuth2 with credentials in the form body.
//! Identity comes from the OpenID `userinfo` endpoint; refresh tokens are
//! only issued to programs enrolled in LinkedIn's refresh-token beta, so
//! accounts without one simply fall back to re-auth at expiry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use syndio_core::PlatformAdapter;
use syndio_domain::{Platform, RemoteIdentity, Result, SyndioError, TokenGrant};

use super::oauth2::{build_url, to_metadata, ProviderEndpoints, TokenResponse};
use super::OAuthApp;
use crate::http::OAuthHttp;

const SCOPES: &str = "openid profile email w_member_social";

pub struct LinkedinAdapter {
    app: OAuthApp,
    http: OAuthHttp,
    endpoints: ProviderEndpoints,
}

impl LinkedinAdapter {
    #[must_use]
    pub fn new(app: OAuthApp, http: OAuthHttp) -> Self {
        Self::with_endpoints(
            app,
            http,
            ProviderEndpoints {
                authorize: "https://www.linkedin.com/oauth/v2/authorization".into(),
                token: "https://www.linkedin.com/oauth/v2/accessToken".into(),
                identity: "https://api.linkedin.com/v2/userinfo".into(),
                long_lived: None,
                refresh: None,
                revoke: Some("https://www.linkedin.com/oauth/v2/revoke".into()),
            },
        )
    }

    #[must_use]
    pub fn with_endpoints(app: OAuthApp, http: OAuthHttp, endpoints: ProviderEndpoints) -> Self {
        Self { app, http, endpoints }
    }
}

#[async_trait]
impl PlatformAdapter for LinkedinAdapter {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn build_authorize_url(&self, state: &str, _code_challenge: Option<&str>) -> Result<String> {
        build_url(
            &self.endpoints.authorize,
            &[
                ("response_type", "code"),
                ("client_id", &self.app.client_id),
                ("redirect_uri", &self.app.redirect_uri),
                ("state", state),
                ("scope", SCOPES),
            ],
        )
    }

    async fn exchange_code(&self, code: &str, _code_verifier: Option<&str>) -> Result<TokenGrant> {
        let response: TokenResponse = self
            .http
            .post_form(
                &self.endpoints.token,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", &self.app.redirect_uri),
                    ("client_id", &self.app.client_id),
                    ("client_secret", self.app.secret()?),
                ],
            )
            .await
            .map_err(|failure| SyndioError::TokenExchangeFailed(failure.describe()))?;

        Ok(response.into_grant())
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<RemoteIdentity> {
        let user: UserInfo = self
            .http
            .get_json(&self.endpoints.identity, access_token)
            .await
            .map_err(|failure| SyndioError::IdentityFetchFailed(failure.describe()))?;

        let raw = to_metadata(&user);
        Ok(RemoteIdentity {
            platform_account_id: user.sub,
            username: user.name,
            profile_picture_url: user.picture,
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

    async fn revoke(&self, access_token: &str) -> Result<()> {
        let Some(revoke) = &self.endpoints.revoke else { return Ok(()) };
        self.http
            .post_discard(
                revoke,
                &[
                    ("token", access_token),
                    ("client_id", &self.app.client_id),
                    ("client_secret", self.app.secret()?),
                ],
            )
            .await
            .map_err(|failure| SyndioError::Network(failure.describe()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct UserInfo {
    sub: String,
    name: String,
    #[serde(default)]
    picture: Option<String>,
}
