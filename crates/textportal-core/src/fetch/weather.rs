use std::sync::{Arc, OnceLock};

use regex::Regex;
use url::Url;

use super::fetcher::ResilientFetcher;
use super::retry::{BusyPhrase, RetryPolicy};
use crate::config::WeatherConfig;
use crate::{Error, Result};

fn ansi_escape() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").ok())
        .as_ref()
}

/// Remove terminal color/control sequences and surrounding whitespace
pub fn strip_ansi(text: &str) -> String {
    match ansi_escape() {
        Some(pattern) => pattern.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}

/// Plain-text weather reports with graceful degradation
///
/// The weather service occasionally answers 200 with a "query is already
/// being processed" body when it sees duplicate requests; that body is
/// retried like any other failure. Once the budget is spent the configured
/// placeholder is returned instead of an error.
pub struct WeatherFetcher {
    fetcher: Arc<ResilientFetcher>,
    base_url: String,
    policy: RetryPolicy,
    busy: BusyPhrase,
    placeholder: String,
}

impl WeatherFetcher {
    pub fn new(fetcher: Arc<ResilientFetcher>, config: &WeatherConfig) -> Self {
        Self {
            fetcher,
            base_url: config.base_url.clone(),
            policy: config.retry_policy(),
            busy: BusyPhrase::new(config.busy_phrase.clone()),
            placeholder: config.placeholder.clone(),
        }
    }

    /// `{base_url}/{location}?T`, the text-only variant of the report
    pub fn report_url(&self, location: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Weather base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .push(location);
        url.set_query(Some("T"));
        Ok(url.to_string())
    }

    /// Current report for `location`, or the placeholder when unavailable
    pub async fn current(&self, location: &str) -> String {
        let url = match self.report_url(location) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(location, error = %e, "Cannot build weather URL");
                return self.placeholder.clone();
            }
        };

        tracing::info!(location, url = %url, "Fetching weather");

        match self.fetcher.fetch_with(&url, &self.policy, &self.busy).await {
            Ok(body) => strip_ansi(&body),
            Err(e) => {
                tracing::warn!(location, error = %e, "Weather unavailable, using placeholder");
                self.placeholder.clone()
            }
        }
    }
}
