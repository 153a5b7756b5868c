//! Shared OAuth HTTP client
//!
//! Thin wrapper over [`reqwest::Client`] used by every platform adapter.
//! Helpers return [`HttpFailure`] so each adapter can map a failure to its
//! own typed error without losing the provider's error body. Messages never
//! include request credentials, only what the provider sent back.

use std::time::Duration;

use serde::de::DeserializeOwned;
use syndio_domain::{HttpConfig, Result, SyndioError};

/// A failed provider request, split by where it failed.
#[derive(Debug)]
pub enum HttpFailure {
    /// Connection, TLS, or timeout trouble; no response received.
    Transport(String),
    /// The provider answered with a non-2xx status.
    Status { status: u16, body: String },
    /// 2xx answer with a body that did not match the expected shape.
    Decode(String),
}

impl HttpFailure {
    /// One-line description suitable for a typed error message.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Transport(message) => format!("request failed: {message}"),
            Self::Status { status, body } => format!("provider returned {status}: {body}"),
            Self::Decode(message) => format!("unexpected provider response: {message}"),
        }
    }
}

impl From<reqwest::Error> for HttpFailure {
    fn from(err: reqwest::Error) -> Self {
        // reqwest redacts URLs with credentials; keep only the description.
        Self::Transport(err.without_url().to_string())
    }
}

impl HttpFailure {
    /// Transport trouble and 5xx answers are worth one more try on
    /// idempotent reads; 4xx answers are not.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

/// HTTP client shared by all adapters.
#[derive(Clone)]
pub struct OAuthHttp {
    client: reqwest::Client,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl OAuthHttp {
    /// Build a client with the configured request timeout.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|err| SyndioError::Config(format!("http client: {err}")))?;
        Ok(Self {
            client,
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    /// POST a form-encoded body and decode the JSON response.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> std::result::Result<T, HttpFailure> {
        let response = self.client.post(url).form(form).send().await?;
        Self::decode(response).await
    }

    /// POST a form-encoded body with HTTP Basic credentials.
    pub async fn post_form_basic<T: DeserializeOwned>(
        &self,
        url: &str,
        username: &str,
        password: &str,
        form: &[(&str, &str)],
    ) -> std::result::Result<T, HttpFailure> {
        let response =
            self.client.post(url).basic_auth(username, Some(password)).form(form).send().await?;
        Self::decode(response).await
    }

    /// GET a JSON document with a bearer token.
    ///
    /// Idempotent, so transient failures get up to `retry_attempts` extra
    /// tries. Token exchanges and refreshes never go through here.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> std::result::Result<T, HttpFailure> {
        let mut attempt = 0;
        loop {
            let result = async {
                let response = self.client.get(url).bearer_auth(access_token).send().await?;
                Self::decode(response).await
            }
            .await;

            match result {
                Err(failure) if failure.is_retryable() && attempt < self.retry_attempts => {
                    attempt += 1;
                    tracing::debug!(attempt, "retrying idempotent provider read");
                    tokio::time::sleep(self.retry_delay).await;
                }
                other => return other,
            }
        }
    }

    /// GET a JSON document with query-string auth only.
    pub async fn get_json_unauthenticated<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> std::result::Result<T, HttpFailure> {
        let response = self.client.get(url).send().await?;
        Self::decode(response).await
    }

    /// POST with no meaningful response body expected.
    pub async fn post_discard(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> std::result::Result<(), HttpFailure> {
        let response = self.client.post(url).form(form).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(HttpFailure::Status { status: status.as_u16(), body })
        }
    }

    /// POST with Basic credentials and no meaningful response body.
    pub async fn post_discard_basic(
        &self,
        url: &str,
        username: &str,
        password: &str,
        form: &[(&str, &str)],
    ) -> std::result::Result<(), HttpFailure> {
        let response =
            self.client.post(url).basic_auth(username, Some(password)).form(form).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(HttpFailure::Status { status: status.as_u16(), body })
        }
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> std::result::Result<T, HttpFailure> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(HttpFailure::Status { status: status.as_u16(), body });
        }

        serde_json::from_str(&body).map_err(|err| HttpFailure::Decode(err.to_string()))
    }
}
