//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building an HTTP client with the configured user agent
//! - GET requests with query parameters and a per-request timeout
//! - Retry with exponential backoff for transient failures
//! - Redirect following with the final URL reported back
//! - Error classification

use crate::config::{HttpConfig, TargetConfig, MAX_BACKOFF_FACTOR};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Response of a completed request
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL after redirects
    pub final_url: String,
    /// HTTP status code
    pub status: u16,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A request that produced no usable response
#[derive(Debug, Error)]
pub enum NetworkFailure {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Giving up on {url} after {attempts} attempts (last status {status})")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        status: u16,
    },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },
}

impl NetworkFailure {
    /// Classifies a reqwest error
    fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_connect() {
            Self::Connect {
                url,
                message: error.to_string(),
            }
        } else if error.is_redirect() {
            Self::RedirectLimit { url }
        } else {
            Self::Http { url, source: error }
        }
    }

    /// Returns true if the same request may succeed when repeated
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connect { .. })
    }
}

/// Bounded retry schedule
///
/// | Condition | Action |
/// |-----------|--------|
/// | Status in `statuses` | Retry, backoff `factor * 2^(n-1)` |
/// | Timeout / connect failure | Retry, same budget and backoff |
/// | Any other status (incl. 4xx) | Return immediately |
/// | Budget spent | `NetworkFailure` |
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first
    pub max_retries: u32,
    /// Base backoff interval
    pub backoff_factor: Duration,
    /// Status codes that trigger a retry
    pub statuses: Vec<u16>,
}

impl RetryPolicy {
    /// Builds the policy from HTTP settings
    ///
    /// The factor is capped at [`MAX_BACKOFF_FACTOR`] seconds; a negative or
    /// NaN factor disables the backoff.
    pub fn from_config(config: &HttpConfig) -> Self {
        let factor = config.backoff_factor.min(MAX_BACKOFF_FACTOR);

        Self {
            max_retries: config.max_retries,
            backoff_factor: Duration::try_from_secs_f64(factor).unwrap_or_default(),
            statuses: config.retry_statuses.clone(),
        }
    }

    /// Delay before the given retry (1-based)
    ///
    /// With a factor of one second this yields 1s, 2s, 4s, ...
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(2u32.pow(exponent))
    }

    /// Returns true if a response with this status should be retried
    pub fn retries_status(&self, status: u16) -> bool {
        self.statuses.contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

/// Builds an HTTP client with proper configuration
///
/// Connections are pooled, so one client serves a whole run.
///
/// # Example
///
/// ```no_run
/// use catalog_crawler::config::{HttpConfig, TargetConfig};
/// use catalog_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&TargetConfig::default(), &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(target: &TargetConfig, http: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(target.user_agent.clone())
        .timeout(Duration::from_secs(http.timeout_secs))
        .connect_timeout(Duration::from_secs(http.timeout_secs))
        .redirect(Policy::limited(http.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP client with automatic retry for transient failures
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    client: Client,
    policy: RetryPolicy,
    timeout: Duration,
}

impl RetryingHttpClient {
    /// Builds a client from the target and HTTP configuration
    pub fn new(target: &TargetConfig, http: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(target, http)?,
            policy: RetryPolicy::from_config(http),
            timeout: Duration::from_secs(http.timeout_secs),
        })
    }

    /// Sends a GET request with the default timeout
    pub async fn get(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<HttpResponse, NetworkFailure> {
        self.get_with_timeout(url, params, self.timeout).await
    }

    /// Sends a GET request, retrying per the client's [`RetryPolicy`]
    ///
    /// Redirects are followed and the final URL is reported in the response.
    /// Non-retryable statuses (including 4xx) are returned as responses, not
    /// failures; callers decide what a non-success status means.
    pub async fn get_with_timeout(
        &self,
        url: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<HttpResponse, NetworkFailure> {
        let mut retries = 0;

        loop {
            let attempt = self
                .client
                .get(url)
                .query(params)
                .timeout(timeout)
                .send()
                .await;

            let failure = match attempt {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if !self.policy.retries_status(status) {
                        let final_url = response.url().to_string();
                        let body = response
                            .text()
                            .await
                            .map_err(|e| NetworkFailure::from_reqwest(url, e))?;

                        return Ok(HttpResponse {
                            final_url,
                            status,
                            body,
                        });
                    }

                    if retries >= self.policy.max_retries {
                        return Err(NetworkFailure::RetriesExhausted {
                            url: url.to_string(),
                            attempts: retries + 1,
                            status,
                        });
                    }

                    format!("HTTP {}", status)
                }
                Err(e) => {
                    let failure = NetworkFailure::from_reqwest(url, e);
                    if !failure.is_transient() || retries >= self.policy.max_retries {
                        return Err(failure);
                    }
                    failure.to_string()
                }
            };

            retries += 1;
            let delay = self.policy.backoff(retries);
            tracing::debug!(
                "Retry {}/{} for {} in {:?} ({})",
                retries,
                self.policy.max_retries,
                url,
                delay,
                failure
            );
            tokio::time::sleep(delay).await;
        }
    }
}
