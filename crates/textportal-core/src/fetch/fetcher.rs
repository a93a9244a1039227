use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Proxy};

use super::retry::{NoSoftFailure, RetryPolicy, SoftFailure};
use crate::config::FetchConfig;
use crate::{Error, Result};

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// HTTP GET with bounded retries and exponential backoff
pub struct ResilientFetcher {
    client: Client,
}

impl ResilientFetcher {
    /// Create a new fetcher with configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Self::build_client(config)?;
        Ok(Self { client })
    }

    /// Build HTTP client with optional proxy
    fn build_client(config: &FetchConfig) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .default_headers(Self::build_headers())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = config.proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for upstream fetching");
        }

        builder.build().map_err(Error::Http)
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/plain;q=0.8,*/*;q=0.5",
            ),
        );
        headers
    }

    /// Fetch `url` as text, retrying failed attempts per `policy`
    pub async fn fetch(&self, url: &str, policy: &RetryPolicy) -> Result<String> {
        self.fetch_with(url, policy, &NoSoftFailure).await
    }

    /// Like [`fetch`](Self::fetch), but bodies flagged by `soft` also count as failed attempts
    pub async fn fetch_with(
        &self,
        url: &str,
        policy: &RetryPolicy,
        soft: &dyn SoftFailure,
    ) -> Result<String> {
        let mut last_reason = String::new();

        for attempt in 0..policy.max_attempts {
            tracing::debug!(url, attempt = attempt + 1, "Fetch attempt");

            match self.attempt(url).await {
                Ok(body) if soft.is_soft_failure(&body) => {
                    tracing::warn!(
                        url,
                        attempt = attempt + 1,
                        "Upstream answered with a retryable soft failure"
                    );
                    last_reason = "upstream reported a retryable condition".to_string();
                }
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::warn!(url, attempt = attempt + 1, error = %e, "Fetch attempt failed");
                    last_reason = e.to_string();
                }
            }

            if !policy.is_last(attempt) {
                let delay = policy.backoff_delay(attempt);
                tracing::debug!(url, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(url, attempts = policy.max_attempts, "Max retries reached, giving up");

        Err(Error::FetchExhausted {
            url: url.to_string(),
            attempts: policy.max_attempts,
            reason: last_reason,
        })
    }

    /// One GET; any transport error or non-success status is a failure
    async fn attempt(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::Other(format!("HTTP {} for URL: {}", status, url)));
        }

        let bytes = response.bytes().await?;
        Self::ensure_content_size(bytes.len(), url)?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn ensure_content_size(size: usize, url: &str) -> Result<()> {
        if size > MAX_BODY_BYTES {
            return Err(Error::Other(format!(
                "Response too large ({} bytes) for URL: {}",
                size, url
            )));
        }
        Ok(())
    }
}
