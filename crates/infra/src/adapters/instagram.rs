//! Instagram adapter
//!
//! Instagram Business accounts authenticate through the Facebook login
//! dialog and Graph API; the identity step walks the user's pages looking
//! for a linked `instagram_business_account`. No refresh endpoint, same as
//! Facebook.

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use syndio_core::PlatformAdapter;
use syndio_domain::{Platform, RemoteIdentity, Result, SyndioError, TokenGrant};

use super::oauth2::{build_url, to_metadata, ProviderEndpoints, TokenResponse};
use super::OAuthApp;
use crate::http::OAuthHttp;

const SCOPES: &str =
    "instagram_basic,instagram_content_publish,pages_show_list,business_management";

pub struct InstagramAdapter {
    app: OAuthApp,
    http: OAuthHttp,
    endpoints: ProviderEndpoints,
}

impl InstagramAdapter {
    #[must_use]
    pub fn new(app: OAuthApp, http: OAuthHttp) -> Self {
        Self::with_endpoints(
            app,
            http,
            ProviderEndpoints {
                authorize: "https://www.facebook.com/v21.0/dialog/oauth".into(),
                token: "https://graph.facebook.com/v21.0/oauth/access_token".into(),
                identity: "https://graph.facebook.com/v21.0/me/accounts".into(),
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
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> Platform {
        Platform::Instagram
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
        let url = build_url(
            &self.endpoints.identity,
            &[("fields", "instagram_business_account{id,username,profile_picture_url}")],
        )?;

        let pages: PagesResponse = self
            .http
            .get_json(&url, access_token)
            .await
            .map_err(|failure| SyndioError::IdentityFetchFailed(failure.describe()))?;

        let business = pages
            .data
            .into_iter()
            .find_map(|page| page.instagram_business_account)
            .ok_or_else(|| {
                SyndioError::IdentityFetchFailed(
                    "no instagram business account linked to any page".into(),
                )
            })?;

        let raw = to_metadata(&business);
        Ok(RemoteIdentity {
            platform_account_id: business.id,
            username: business.username,
            profile_picture_url: business.profile_picture_url,
            raw,
        })
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant> {
        Err(SyndioError::RefreshUnsupported)
    }
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    #[serde(default)]
    data: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    instagram_business_account: Option<BusinessAccount>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BusinessAccount {
    id: String,
    username: String,
    #[serde(default)]
    profile_picture_url: Option<String>,
}
