use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::cache::ArtifactCache;
use crate::clock::Clock;
use crate::config::{AppConfig, WeatherLocation};
use crate::feed::FeedAggregator;
use crate::fetch::{ResilientFetcher, WeatherFetcher};
use crate::render::{PageRenderer, RenderOptions, WeatherReport};
use crate::{Error, Result};

/// Summary of one successful regeneration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerationReport {
    pub run_id: Uuid,
    /// Dated articles across all reachable feeds
    pub articles: usize,
    /// Locations that fell back to the weather placeholder
    pub weather_unavailable: usize,
    /// Artifact keys written, in write order
    pub written: Vec<String>,
}

/// Something that rebuilds and republishes the cached pages
#[async_trait::async_trait]
pub trait Regenerator: Send + Sync {
    async fn run(&self) -> Result<RegenerationReport>;
}

pub struct RegenerationJob {
    weather: WeatherFetcher,
    locations: Vec<WeatherLocation>,
    placeholder: String,
    aggregator: FeedAggregator,
    feed_urls: Vec<String>,
    renderer: PageRenderer,
    cache: Arc<ArtifactCache>,
    clock: Arc<dyn Clock>,
    front_page_key: String,
    archive_key: String,
}

impl RegenerationJob {
    pub fn from_config(
        config: &AppConfig,
        cache: Arc<ArtifactCache>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let fetcher = Arc::new(ResilientFetcher::new(&config.fetch)?);

        Ok(Self {
            weather: WeatherFetcher::new(Arc::clone(&fetcher), &config.weather),
            locations: config.weather.locations.clone(),
            placeholder: config.weather.placeholder.clone(),
            aggregator: FeedAggregator::new(
                fetcher,
                config.fetch.retry_policy(),
                config.fetch.concurrency,
            ),
            feed_urls: config.feeds.urls.clone(),
            renderer: PageRenderer::new(RenderOptions::from_config(config)?),
            cache,
            clock,
            front_page_key: config.cache.front_page_key.clone(),
            archive_key: config.cache.archive_key.clone(),
        })
    }

    async fn regenerate(&self, run_id: Uuid) -> Result<RegenerationReport> {
        tracing::info!(feeds = self.feed_urls.len(), locations = self.locations.len(), "Regeneration started");

        let mut weather = Vec::with_capacity(self.locations.len());
        for location in &self.locations {
            weather.push(WeatherReport {
                label: location.label.clone(),
                report: self.weather.current(&location.query).await,
            });
        }
        let weather_unavailable = weather
            .iter()
            .filter(|entry| entry.report == self.placeholder)
            .count();

        let articles = self.aggregator.aggregate_all(&self.feed_urls).await;
        tracing::info!(articles = articles.len(), "Feeds aggregated");

        let front_page = self.renderer.front_page(&weather, &articles);
        let archive = self.renderer.archive(&articles, self.clock.now());

        // Both writes are attempted; one failing does not undo the other
        let mut written = Vec::new();
        let mut failed = Vec::new();
        for (key, html) in [(&self.front_page_key, front_page), (&self.archive_key, archive)] {
            match self.cache.write(key, &html).await {
                Ok(()) => written.push(key.clone()),
                Err(e) => {
                    tracing::error!(artifact = %key, error = %e, "Failed to write artifact");
                    failed.push(format!("{}: {}", key, e));
                }
            }
        }

        if !failed.is_empty() {
            return Err(Error::Regeneration(failed.join("; ")));
        }

        tracing::info!(written = ?written, weather_unavailable, "Regeneration finished");
        Ok(RegenerationReport {
            run_id,
            articles: articles.len(),
            weather_unavailable,
            written,
        })
    }
}

#[async_trait::async_trait]
impl Regenerator for RegenerationJob {
    async fn run(&self) -> Result<RegenerationReport> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("regenerate", %run_id);
        self.regenerate(run_id).instrument(span).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheLookup, Freshness, MemoryStore};
    use crate::clock::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    async fn upstream() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Jakarta"))
            .respond_with(ResponseTemplate::new(200).set_body_string("\x1b[38;5;226mSunny\x1b[0m +31°C\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Tokyo"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<?xml version="1.0"?>
                <rss version="2.0"><channel><title>Wire</title>
                <item><title>Fresh story</title><link>https://example.com/fresh</link>
                <pubDate>Wed, 01 May 2024 11:00:00 GMT</pubDate></item>
                <item><title>Undated story</title><link>https://example.com/undated</link></item>
                </channel></rss>"#,
            ))
            .mount(&server)
            .await;
        server
    }

    fn config(server: &MockServer) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.backend = "memory".to_string();
        config.weather.base_url = server.uri();
        config.weather.base_delay_ms = 1;
        config.weather.max_attempts = 2;
        config.fetch.base_delay_ms = 1;
        config.feeds.urls = vec![format!("{}/feed.xml", server.uri())];
        config
    }

    fn setup(config: &AppConfig) -> (Arc<MemoryStore>, Arc<ArtifactCache>, RegenerationJob) {
        let clock = Arc::new(ManualClock::new(now()));
        let store = Arc::new(MemoryStore::new(clock.clone()));
        let cache = Arc::new(ArtifactCache::new(
            store.clone(),
            clock.clone(),
            config.cache.freshness_window(),
        ));
        let job = RegenerationJob::from_config(config, Arc::clone(&cache), clock).unwrap();
        (store, cache, job)
    }

    #[tokio::test]
    async fn test_run_writes_both_artifacts() {
        let server = upstream().await;
        let config = config(&server);
        let (_store, cache, job) = setup(&config);

        let report = job.run().await.unwrap();
        assert_eq!(report.articles, 1);
        assert_eq!(report.weather_unavailable, 1);
        assert_eq!(report.written, vec!["index.html", "news_archive.html"]);

        let front = cache.read("index.html").await;
        assert_eq!(front.freshness(), Freshness::Fresh);
        let front = String::from_utf8(front.into_content().unwrap().to_vec()).unwrap();
        assert!(front.contains("<pre>Sunny +31°C</pre>"));
        assert!(front.contains("<pre>Weather data not available.</pre>"));
        assert!(front.contains(">Fresh story</a>"));
        assert!(!front.contains("Undated story"));

        let archive = cache.read("news_archive.html").await;
        let archive = String::from_utf8(archive.into_content().unwrap().to_vec()).unwrap();
        assert!(archive.contains(">Fresh story</a>"));
    }

    #[tokio::test]
    async fn test_second_write_failure_fails_run_and_keeps_first() {
        let server = upstream().await;
        let config = config(&server);
        let (store, cache, job) = setup(&config);
        store.fail_writes_to("news_archive.html");

        let result = job.run().await;
        assert!(matches!(result, Err(Error::Regeneration(_))));

        assert_eq!(cache.read("index.html").await.freshness(), Freshness::Fresh);
        assert_eq!(cache.read("news_archive.html").await, CacheLookup::Absent);
    }

    #[tokio::test]
    async fn test_first_write_failure_still_writes_second() {
        let server = upstream().await;
        let config = config(&server);
        let (store, cache, job) = setup(&config);
        store.fail_writes_to("index.html");

        assert!(job.run().await.is_err());
        assert_eq!(cache.read("index.html").await, CacheLookup::Absent);
        assert_eq!(cache.read("news_archive.html").await.freshness(), Freshness::Fresh);
    }

    #[tokio::test]
    async fn test_unreachable_upstreams_still_publish() {
        let server = MockServer::start().await;
        let mut config = config(&server);
        config.fetch.max_attempts = 1;
        let (_store, cache, job) = setup(&config);

        let report = job.run().await.unwrap();
        assert_eq!(report.articles, 0);
        assert_eq!(report.weather_unavailable, 2);

        let archive = cache.read("news_archive.html").await;
        let archive = String::from_utf8(archive.into_content().unwrap().to_vec()).unwrap();
        assert!(archive.contains("No news articles found"));
    }
}
