//! Platform adapters
//!
//! One [`PlatformAdapter`] implementation per supported platform. Each file
//! owns its platform's endpoints, scopes, PKCE usage, expiry semantics, and
//! identity response shapes; the manager in `syndio-core` never sees any of
//! it.

pub mod facebook;
pub mod instagram;
pub mod linkedin;
mod oauth2;
pub mod patreon;
pub mod threads;
pub mod twitter;
pub mod youtube;

use std::sync::Arc;

pub use oauth2::ProviderEndpoints;
use syndio_core::PlatformAdapter;
use syndio_domain::{Platform, ProviderSettings, Result, SyndioError};

use crate::http::OAuthHttp;
use facebook::FacebookAdapter;
use instagram::InstagramAdapter;
use linkedin::LinkedinAdapter;
use patreon::PatreonAdapter;
use threads::ThreadsAdapter;
use twitter::TwitterAdapter;
use youtube::YoutubeAdapter;

/// Registered OAuth application credentials for one platform.
#[derive(Debug, Clone)]
pub struct OAuthApp {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
}

impl OAuthApp {
    #[must_use]
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
        }
    }

    /// The client secret, required by every current platform's token
    /// endpoint.
    pub(crate) fn secret(&self) -> Result<&str> {
        self.client_secret
            .as_deref()
            .ok_or_else(|| SyndioError::Config("client secret not configured".into()))
    }
}

/// Construct the adapter for a platform from its configured credentials.
pub fn create_adapter(
    platform: Platform,
    settings: &ProviderSettings,
    http: OAuthHttp,
) -> Arc<dyn PlatformAdapter> {
    let app = OAuthApp::new(settings);
    match platform {
        Platform::Facebook => Arc::new(FacebookAdapter::new(app, http)),
        Platform::Instagram => Arc::new(InstagramAdapter::new(app, http)),
        Platform::LinkedIn => Arc::new(LinkedinAdapter::new(app, http)),
        Platform::Twitter => Arc::new(TwitterAdapter::new(app, http)),
        Platform::Threads => Arc::new(ThreadsAdapter::new(app, http)),
        Platform::YouTube => Arc::new(YoutubeAdapter::new(app, http)),
        Platform::Patreon => Arc::new(PatreonAdapter::new(app, http)),
    }
}
