//! HTTP transports for the weather provider
//!
//! [`HttpTransport`] retries transient failures with exponential backoff.
//! [`CachedTransport`] wraps any transport with the persistent response cache.

use crate::cache::ResponseCache;
use crate::config::RetryConfig;
use crate::{BriefError, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    RetryTransientMiddleware, Retryable, RetryableStrategy, default_on_request_failure,
    policies::ExponentialBackoff,
};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry policy for the weather transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every following one
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .retry_bounds(self.backoff_base, MAX_BACKOFF.max(self.backoff_base))
            .build_with_max_retries(self.max_retries)
    }
}

/// Retries 5xx responses, connection errors and timeouts. Every 4xx is final.
struct ServerErrorStrategy;

impl RetryableStrategy for ServerErrorStrategy {
    fn handle(
        &self,
        res: &std::result::Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if response.status().is_server_error() => Some(Retryable::Transient),
            Ok(response) if response.status().is_client_error() => Some(Retryable::Fatal),
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}

/// Fetches the body of a successful GET request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url) -> Result<String>;
}

/// Error body returned by the provider for rejected requests
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    reason: String,
}

/// Network transport with retry on connection errors, timeouts and 5xx responses only
pub struct HttpTransport {
    client: ClientWithMiddleware,
}

impl HttpTransport {
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("WeatherBrief/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BriefError::network(format!("Failed to create HTTP client: {e}")))?;

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                policy.backoff(),
                ServerErrorStrategy,
            ))
            .build();

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(name = "http_get", skip(self, url), fields(host = url.host_str().unwrap_or_default()))]
    async fn get(&self, url: &Url) -> Result<String> {
        let start_time = Instant::now();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| BriefError::network(format!("Request failed after retries: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BriefError::network(format!("Failed to read response body: {e}")))?;

        let elapsed = start_time.elapsed();
        debug!("HTTP response received: {} in {:.3}s", status, elapsed.as_secs_f64());
        if elapsed.as_secs() > 5 {
            warn!("Slow weather API response: {:.3}s", elapsed.as_secs_f64());
        }

        classify_response(status, body)
    }
}

fn classify_response(status: StatusCode, body: String) -> Result<String> {
    if status.is_success() {
        return Ok(body);
    }

    let detail = serde_json::from_str::<ProviderErrorBody>(&body)
        .map(|err| err.reason)
        .unwrap_or_else(|_| truncate_body(&body));

    if status.is_server_error() {
        Err(BriefError::network(format!(
            "Weather provider kept failing with {status}: {detail}"
        )))
    } else {
        Err(BriefError::provider(format!(
            "Weather provider rejected the request with {status}: {detail}"
        )))
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Caches successful responses by request URL for a fixed time-to-live
pub struct CachedTransport<T> {
    inner: T,
    cache: ResponseCache,
    ttl: Duration,
}

impl<T: Transport> CachedTransport<T> {
    pub fn new(inner: T, cache: ResponseCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl<T: Transport> Transport for CachedTransport<T> {
    async fn get(&self, url: &Url) -> Result<String> {
        let key = url.as_str();

        match self.cache.get::<String>(key).await {
            Ok(Some(body)) => {
                info!("Serving forecast from cache");
                return Ok(body);
            }
            Ok(None) => debug!("Cache miss, fetching from provider"),
            Err(e) => warn!("Cache read failed, fetching from provider: {e}"),
        }

        let body = self.inner.get(url).await?;

        if let Err(e) = self.cache.put(key, body.clone(), self.ttl).await {
            warn!("Failed to store response in cache: {e}");
        }

        Ok(body)
    }
}
