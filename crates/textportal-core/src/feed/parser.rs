use chrono::{DateTime, Utc};
use feed_rs::parser;

use super::models::{Article, DEFAULT_LINK, DEFAULT_TITLE};
use crate::{Error, Result};

/// Parsed feed data from RSS/Atom content
#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub articles: Vec<Article>,
}

/// Parse RSS/Atom content into articles labelled with the feed's source name
///
/// `url` becomes the source label when the feed carries no title. Entries
/// keep their document order; dateless entries are kept here and dropped by
/// the aggregator.
pub fn parse_feed(content: &[u8], url: &str) -> Result<ParsedFeed> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty());

    let source = title.clone().unwrap_or_else(|| url.to_string());

    let articles = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string());

            let link = entry
                .links
                .first()
                .map(|l| l.href.trim().to_string())
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| DEFAULT_LINK.to_string());

            // An update time is not a publish time
            let published = entry.published.map(|dt| DateTime::<Utc>::from(dt));

            Article {
                title,
                link,
                published,
                source: source.clone(),
            }
        })
        .collect();

    Ok(ParsedFeed { title, articles })
}
