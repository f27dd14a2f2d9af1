//! HTTP client wrapper with rate limiting

use crate::error::{Error, Result};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Rate limiter for a specific registry
pub type RegistryRateLimiter = Arc<
    RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
>;

/// HTTP client wrapper for registry requests with optional rate limiting
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    rate_limiter: Option<RegistryRateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client without rate limiting
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: Self::build_client(timeout)?,
            rate_limiter: None,
        })
    }

    /// Create a new HTTP client with rate limiting
    ///
    /// A limit of `0` requests per second disables rate limiting.
    pub fn with_rate_limit(requests_per_second: u32, timeout: Duration) -> Result<Self> {
        let rate_limiter = NonZeroU32::new(requests_per_second)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self {
            client: Self::build_client(timeout)?,
            rate_limiter,
        })
    }

    fn build_client(timeout: Duration) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .user_agent(format!("deptrail/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?)
    }

    /// Wait for rate limiter if enabled
    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }

    /// Make a GET request and deserialize JSON response
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.get_json_with_headers(url, reqwest::header::HeaderMap::new())
            .await
    }

    /// Make a GET request with custom headers and deserialize JSON response
    pub async fn get_json_with_headers<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        headers: reqwest::header::HeaderMap,
    ) -> Result<T> {
        self.wait_for_rate_limit().await;
        tracing::trace!(url, "registry request");

        let response = self.client.get(url).headers(headers).send().await?;

        // Handle rate limiting (HTTP 429)
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimitExceeded(url.to_string()));
        }

        if !response.status().is_success() {
            return Err(Error::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        // Read as bytes so malformed bodies surface as Error::Json
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
