//! HTTP client with tracing and bearer authentication.

use reqwest::{Client, Response, header};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// User agent string for BillSight.
const USER_AGENT: &str = concat!("BillSight/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// Thin wrapper around [`reqwest::Client`] with a fixed user agent and
/// transport timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Creates a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { inner, timeout })
    }

    /// Returns the transport timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a POST with a JSON body and a bearer token.
    ///
    /// The token is never recorded in spans.
    #[instrument(skip(self, token, body), fields(url = %url))]
    pub async fn post_json_with_auth<T: serde::Serialize + ?Sized>(
        &self,
        url: &Url,
        token: &str,
        body: &T,
    ) -> Result<Response, reqwest::Error> {
        debug!("POST request with JSON");

        let response = self
            .inner
            .post(url.clone())
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for Response handling.
pub trait ResponseExt {
    /// Get the Retry-After header value in seconds.
    fn retry_after_secs(&self) -> Option<u64>;
}

impl ResponseExt for Response {
    fn retry_after_secs(&self) -> Option<u64> {
        self.headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }
}
