use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::RetryPolicy;

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TEXTPORTAL_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub front_page: FrontPageConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds after the last write before an artifact is considered stale
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
    /// Blob key of the front page artifact
    #[serde(default = "default_front_page_key")]
    pub front_page_key: String,
    /// Blob key of the archive artifact
    #[serde(default = "default_archive_key")]
    pub archive_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_secs: default_freshness_secs(),
            front_page_key: default_front_page_key(),
            archive_key: default_archive_key(),
        }
    }
}

impl CacheConfig {
    /// Saturates at `chrono::Duration::MAX` for values chrono cannot represent
    pub fn freshness_window(&self) -> chrono::Duration {
        i64::try_from(self.freshness_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontPageConfig {
    /// Number of latest articles shown on the front page
    #[serde(default = "default_article_limit")]
    pub article_limit: usize,
}

impl Default for FrontPageConfig {
    fn default() -> Self {
        Self {
            article_limit: default_article_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Articles published within this many hours go on the archive page
    #[serde(default = "default_archive_window_hours")]
    pub window_hours: u32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            window_hours: default_archive_window_hours(),
        }
    }
}

impl ArchiveConfig {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::try_hours(i64::from(self.window_hours)).unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsConfig {
    /// RSS/Atom feed URLs, in display order for equal timestamps
    #[serde(default = "default_feed_urls")]
    pub urls: Vec<String>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            urls: default_feed_urls(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherLocation {
    /// Location name sent to the weather service
    pub query: String,
    /// Heading shown on the front page
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base URL of the text weather service
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_weather_locations")]
    pub locations: Vec<WeatherLocation>,
    #[serde(default = "default_weather_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_weather_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Body text meaning "busy with a duplicate query, try again"
    #[serde(default = "default_weather_busy_phrase")]
    pub busy_phrase: String,
    /// Shown in place of the report when every attempt failed
    #[serde(default = "default_weather_placeholder")]
    pub placeholder: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_weather_base_url(),
            locations: default_weather_locations(),
            max_attempts: default_weather_attempts(),
            base_delay_ms: default_weather_base_delay_ms(),
            busy_phrase: default_weather_busy_phrase(),
            placeholder: default_weather_placeholder(),
        }
    }
}

impl WeatherConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-attempt request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Attempts per feed document
    #[serde(default = "default_feed_attempts")]
    pub max_attempts: u32,
    /// First backoff delay for feed documents, doubled after every attempt
    #[serde(default = "default_feed_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Feeds fetched at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// HTTP proxy URL (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            max_attempts: default_feed_attempts(),
            base_delay_ms: default_feed_base_delay_ms(),
            concurrency: default_concurrency(),
            proxy_url: None,
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// "s3", "local" or "memory"
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Custom S3 endpoint (MinIO, or https://storage.googleapis.com for GCS interoperability)
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub path_style: bool,
    /// Static credentials; the default AWS provider chain is used when unset
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Directory for the local backend
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            bucket: default_bucket(),
            endpoint: None,
            region: default_region(),
            path_style: false,
            access_key: None,
            secret_key: None,
            local_dir: default_local_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Deployment routing prefix stripped from request paths (e.g., "/portal")
    #[serde(default)]
    pub route_prefix: String,
    /// In-process regeneration interval in seconds (0 = rely on an external scheduler)
    #[serde(default)]
    pub refresh_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            route_prefix: String::new(),
            refresh_interval_secs: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_site_title")]
    pub site_title: String,
    /// Offset from UTC used for displayed timestamps
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// HTML fragment appended to the front page (directory links)
    #[serde(default)]
    pub links_file: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            site_title: default_site_title(),
            utc_offset_hours: default_utc_offset_hours(),
            links_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_freshness_secs() -> u64 {
    600 // 10 minutes
}

fn default_front_page_key() -> String {
    "index.html".to_string()
}

fn default_archive_key() -> String {
    "news_archive.html".to_string()
}

fn default_article_limit() -> usize {
    10
}

fn default_archive_window_hours() -> u32 {
    72
}

fn default_feed_urls() -> Vec<String> {
    [
        "http://rss.cnn.com/rss/cnn_topstories.rss",
        "http://feeds.bbci.co.uk/news/world/rss.xml",
        "https://www.nytimes.com/services/xml/rss/nyt/HomePage.xml",
        "https://www.theguardian.com/world/rss",
        "https://time.com/feed/",
        "https://arstechnica.com/feed/",
        "https://www.techcrunch.com/feed/",
        "https://www.wired.com/feed/rss",
        "https://www.engadget.com/rss.xml",
        "https://www.cnet.com/rss/news/",
        "https://www.zdnet.com/news/rss.xml",
        "https://www.antaranews.com/rss/terkini",
        "https://www.japantimes.co.jp/feed/",
        "https://mainichi.jp/rss/etc/mainichi-e.rss",
        "https://feeds.feedburner.com/TechCrunch/startups",
        "http://rss.tempo.co/nasional",
        "https://www.republika.co.id/rss/",
        "https://news.detik.com/berita/rss",
        "https://www.tribunnews.com/rss",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_weather_base_url() -> String {
    "https://wttr.in".to_string()
}

fn default_weather_locations() -> Vec<WeatherLocation> {
    vec![
        WeatherLocation {
            query: "Jakarta".to_string(),
            label: "Jakarta, Indonesia".to_string(),
        },
        WeatherLocation {
            query: "Tokyo".to_string(),
            label: "Tokyo, Japan".to_string(),
        },
    ]
}

fn default_weather_attempts() -> u32 {
    5
}

fn default_weather_base_delay_ms() -> u64 {
    2000
}

fn default_weather_busy_phrase() -> String {
    "This query is already being processed".to_string()
}

fn default_weather_placeholder() -> String {
    "Weather data not available.".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_feed_attempts() -> u32 {
    3
}

fn default_feed_base_delay_ms() -> u64 {
    1000
}

fn default_concurrency() -> usize {
    4
}

fn default_user_agent() -> String {
    format!("textportal/{}", env!("CARGO_PKG_VERSION"))
}

fn default_storage_backend() -> String {
    "s3".to_string()
}

fn default_bucket() -> String {
    "text-only-portal-cache".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_local_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("textportal")
        .join("artifacts")
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_site_title() -> String {
    "Text-Only Portal".to_string()
}

fn default_utc_offset_hours() -> i32 {
    7 // WIB
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file (or defaults), then apply environment overrides
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        let config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.finish()
    }

    /// Load an explicit file, which must exist, then apply environment overrides
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        Self::from_file(&expand_tilde(path))?.finish()
    }

    fn finish(mut self) -> crate::Result<Self> {
        self.apply_env_overrides(|key| std::env::var(key).ok())?;
        self.validate()?;
        Ok(self)
    }

    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Get the configuration file path
    /// `$TEXTPORTAL_CONFIG`, else ~/.config/textportal/config.toml
    pub fn config_path() -> PathBuf {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            return expand_tilde(Path::new(&explicit));
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("textportal")
            .join("config.toml")
    }

    /// Apply deployment overrides; `lookup` is `std::env::var` outside of tests
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> crate::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup("TEXTPORTAL_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Some(backend) = lookup("TEXTPORTAL_STORAGE_BACKEND") {
            self.storage.backend = backend;
        }
        if let Some(endpoint) = lookup("TEXTPORTAL_STORAGE_ENDPOINT") {
            self.storage.endpoint = Some(endpoint);
        }
        if let Some(prefix) = lookup("TEXTPORTAL_ROUTE_PREFIX") {
            self.server.route_prefix = prefix;
        }
        if let Some(secs) = lookup("TEXTPORTAL_FRESHNESS_SECS") {
            self.cache.freshness_secs = secs.trim().parse().map_err(|_| {
                crate::Error::Config(format!("TEXTPORTAL_FRESHNESS_SECS is not a number: {}", secs))
            })?;
        }
        // Hosted runtimes hand out the listening port this way
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|_| crate::Error::Config(format!("PORT is not a valid port: {}", port)))?;
            self.server.bind = format!("0.0.0.0:{}", port);
        }
        Ok(())
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.fetch.max_attempts == 0 || self.weather.max_attempts == 0 {
            return Err(crate::Error::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        match self.storage.backend.as_str() {
            "s3" => {
                if self.storage.bucket.trim().is_empty() {
                    return Err(crate::Error::Config(
                        "storage.bucket is required for the s3 backend".to_string(),
                    ));
                }
            }
            "local" | "memory" => {}
            other => {
                return Err(crate::Error::Config(format!(
                    "Unknown storage backend: {}",
                    other
                )))
            }
        }

        if !self.server.route_prefix.is_empty() && !self.server.route_prefix.starts_with('/') {
            return Err(crate::Error::Config(format!(
                "server.route_prefix must start with '/': {}",
                self.server.route_prefix
            )));
        }

        if self.weather.locations.is_empty() {
            return Err(crate::Error::Config(
                "at least one weather location is required".to_string(),
            ));
        }

        Ok(())
    }

    /// Local storage directory (with tilde expansion)
    pub fn local_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.local_dir)
    }

    /// Route prefix without a trailing slash
    pub fn route_prefix(&self) -> &str {
        self.server.route_prefix.trim_end_matches('/')
    }
}
