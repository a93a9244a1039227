//! HTML for the two published pages
//!
//! Pages are plain HTML without scripts or images so they read well in
//! text-mode browsers such as Lynx. All text taken from feeds or the weather
//! service is escaped.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::config::AppConfig;
use crate::feed::{recent_articles, Article};
use crate::{Error, Result};

const STYLE: &str = "        body { font-family: monospace; line-height: 1.6; margin: 20px; background-color: #f0f0f0; color: #333; }
        h1, h2 { color: #000; border-bottom: 1px solid #999; padding-bottom: 5px; margin-top: 20px; }
        ul { list-style-type: none; padding: 0; }
        li { margin-bottom: 5px; }
        a { color: #0000ee; text-decoration: none; }
        a:hover { text-decoration: underline; }
        .section { margin-bottom: 30px; }
        pre { white-space: pre-wrap; word-wrap: break-word; }
";

/// Weather text for one configured location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub label: String,
    pub report: String,
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub site_title: String,
    pub utc_offset: FixedOffset,
    pub article_limit: usize,
    pub archive_window: Duration,
    /// Prefix prepended to every internal link, without a trailing slash
    pub route_prefix: String,
    pub archive_key: String,
    /// Trusted HTML appended to the front page
    pub links_html: Option<String>,
}

impl RenderOptions {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let hours = config.render.utc_offset_hours;
        let utc_offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| Error::Config(format!("render.utc_offset_hours out of range: {}", hours)))?;

        let links_html = match &config.render.links_file {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Cannot read links file {}: {}", path.display(), e))
            })?),
            None => None,
        };

        Ok(Self {
            site_title: config.render.site_title.clone(),
            utc_offset,
            article_limit: config.front_page.article_limit,
            archive_window: config.archive.window(),
            route_prefix: config.route_prefix().to_string(),
            archive_key: config.cache.archive_key.clone(),
            links_html,
        })
    }
}

pub struct PageRenderer {
    options: RenderOptions,
}

impl PageRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Front page: weather per location, the latest articles and the archive link
    pub fn front_page(&self, weather: &[WeatherReport], articles: &[Article]) -> String {
        let opts = &self.options;
        let mut html = page_head(&opts.site_title);

        html.push_str(&format!(
            "    <h1>Welcome to Your {}</h1>\n",
            escape_html(&opts.site_title)
        ));
        html.push_str(
            "    <p>This page provides dynamic content optimized for text-based browsers like Lynx.</p>\n\n",
        );

        html.push_str("    <div class=\"section\">\n        <h2>Current Weather</h2>\n");
        for entry in weather {
            html.push_str(&format!(
                "        <h3>{}</h3>\n        <pre>{}</pre>\n",
                escape_html(&entry.label),
                escape_html(&entry.report)
            ));
        }
        html.push_str("    </div>\n\n");

        html.push_str(&format!(
            "    <div class=\"section\">\n        <h2>Latest {} News</h2>\n        <ul>\n",
            opts.article_limit
        ));
        for article in articles.iter().take(opts.article_limit) {
            html.push_str(&self.article_item(article));
        }
        html.push_str("        </ul>\n");
        html.push_str(&format!(
            "        <p><a href=\"{}\">View All News (Last {} Hours)</a></p>\n    </div>\n",
            escape_html(&self.archive_href()),
            opts.archive_window.num_hours()
        ));

        if let Some(links) = &opts.links_html {
            html.push('\n');
            html.push_str(links);
            html.push('\n');
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    /// Archive page: every article published within the archive window
    pub fn archive(&self, articles: &[Article], now: DateTime<Utc>) -> String {
        let opts = &self.options;
        let hours = opts.archive_window.num_hours();
        let heading = format!("All News from the Last {} Hours", hours);
        let back = format!(
            "    <p><a href=\"{}\">Back to Homepage</a></p>\n",
            escape_html(&self.home_href())
        );

        let mut html = page_head(&heading);
        html.push_str(&format!("    <h1>{}</h1>\n", heading));
        html.push_str(&format!(
            "    <p>This page lists all aggregated news articles from the past {} hours.</p>\n",
            hours
        ));
        html.push_str(&back);
        html.push_str("\n    <div class=\"section\">\n        <ul>\n");

        let recent = recent_articles(articles, opts.archive_window, now);
        if recent.is_empty() {
            html.push_str(&format!(
                "            <li>No news articles found for the last {} hours.</li>\n",
                hours
            ));
        }
        for article in &recent {
            html.push_str(&self.article_item(article));
        }

        html.push_str("        </ul>\n");
        html.push_str(&back);
        html.push_str("    </div>\n</body>\n</html>\n");
        html
    }

    fn article_item(&self, article: &Article) -> String {
        let date = article
            .published
            .map(|at| {
                at.with_timezone(&self.options.utc_offset)
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
            })
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "            <li>[{}] <a href=\"{}\">{}</a> (Source: {})</li>\n",
            date,
            escape_html(&article.link),
            escape_html(&article.title),
            escape_html(&article.source)
        )
    }

    fn home_href(&self) -> String {
        format!("{}/", self.options.route_prefix)
    }

    fn archive_href(&self) -> String {
        format!("{}/{}", self.options.route_prefix, self.options.archive_key)
    }
}

fn page_head(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n    \
         <title>{}</title>\n    <style>\n{}    </style>\n</head>\n<body>\n",
        escape_html(title),
        STYLE
    )
}

/// Escape text for use in element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn article(title: &str, published: Option<DateTime<Utc>>) -> Article {
        Article {
            title: title.to_string(),
            link: format!("https://example.com/{}", title),
            published,
            source: "Example".to_string(),
        }
    }

    fn renderer() -> PageRenderer {
        PageRenderer::new(RenderOptions::from_config(&AppConfig::default()).unwrap())
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_front_page_limits_and_formats() {
        let articles: Vec<Article> = (0..12)
            .map(|i| article(&format!("story-{}", i), Some(now() - Duration::hours(i))))
            .collect();
        let weather = vec![
            WeatherReport {
                label: "Jakarta, Indonesia".to_string(),
                report: "Sunny +31°C".to_string(),
            },
            WeatherReport {
                label: "Tokyo, Japan".to_string(),
                report: "Weather data not available.".to_string(),
            },
        ];

        let html = renderer().front_page(&weather, &articles);

        assert!(html.contains("<h3>Jakarta, Indonesia</h3>\n        <pre>Sunny +31°C</pre>"));
        assert!(html.contains("<pre>Weather data not available.</pre>"));
        assert!(html.contains(">story-9</a>"));
        assert!(!html.contains(">story-10</a>"));
        // 12:00 UTC shown at +07:00
        assert!(html.contains("[2024-05-01 19:00] <a href=\"https://example.com/story-0\">"));
        assert!(html.contains("<a href=\"/news_archive.html\">View All News (Last 72 Hours)</a>"));
    }

    #[test]
    fn test_feed_text_is_escaped() {
        let mut evil = article("x", Some(now()));
        evil.title = "<script>alert(1)</script>".to_string();
        evil.link = "https://example.com/?a=1&b=\"2\"".to_string();

        let html = renderer().front_page(&[], &[evil]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\""));
    }

    #[test]
    fn test_archive_window() {
        let mut config = AppConfig::default();
        config.archive.window_hours = 24;
        let renderer = PageRenderer::new(RenderOptions::from_config(&config).unwrap());

        let articles = vec![
            article("now", Some(now())),
            article("yesterday", Some(now() - Duration::hours(23))),
            article("older", Some(now() - Duration::hours(25))),
        ];
        let html = renderer.archive(&articles, now());

        assert!(html.contains("<h1>All News from the Last 24 Hours</h1>"));
        assert!(html.contains(">now</a>"));
        assert!(html.contains(">yesterday</a>"));
        assert!(!html.contains(">older</a>"));
    }

    #[test]
    fn test_unbounded_archive_window() {
        let mut config = AppConfig::default();
        config.archive.window_hours = u32::MAX;
        let renderer = PageRenderer::new(RenderOptions::from_config(&config).unwrap());

        let articles = vec![
            article("now", Some(now())),
            article("decades-old", Some(Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap())),
        ];
        let html = renderer.archive(&articles, now());

        assert!(html.contains(&format!("Last {} Hours", u32::MAX)));
        assert!(html.contains(">now</a>"));
        assert!(html.contains(">decades-old</a>"));
    }

    #[test]
    fn test_empty_archive() {
        let html = renderer().archive(&[], now());
        assert!(html.contains("<li>No news articles found for the last 72 hours.</li>"));
    }

    #[test]
    fn test_links_honour_route_prefix_and_links_file() {
        let dir = tempfile::tempdir().unwrap();
        let links_path = dir.path().join("links.html");
        std::fs::write(&links_path, "<div class=\"section\"><h2>Links</h2></div>").unwrap();

        let mut config = AppConfig::default();
        config.server.route_prefix = "/portal/".to_string();
        config.render.links_file = Some(links_path);
        let renderer = PageRenderer::new(RenderOptions::from_config(&config).unwrap());

        let front = renderer.front_page(&[], &[]);
        assert!(front.contains("href=\"/portal/news_archive.html\""));
        assert!(front.contains("<div class=\"section\"><h2>Links</h2></div>"));

        let archive = renderer.archive(&[], now());
        assert!(archive.contains("<a href=\"/portal/\">Back to Homepage</a>"));
    }

    #[test]
    fn test_invalid_options() {
        let mut config = AppConfig::default();
        config.render.utc_offset_hours = 30;
        assert!(RenderOptions::from_config(&config).is_err());

        let mut config = AppConfig::default();
        config.render.links_file = Some("/nonexistent/links.html".into());
        assert!(RenderOptions::from_config(&config).is_err());
    }
}
