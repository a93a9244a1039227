use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TITLE: &str = "No Title";
pub const DEFAULT_LINK: &str = "#";

/// A normalized feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    /// Feed title, or the feed URL when the feed has none
    pub source: String,
}

impl Article {
    /// Published at or after `now - window`
    ///
    /// A window reaching past the earliest representable time admits every
    /// dated article.
    pub fn is_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        let Some(published) = self.published else {
            return false;
        };
        match now.checked_sub_signed(window) {
            Some(cutoff) => published >= cutoff,
            None => true,
        }
    }
}

/// Articles published within `window` of `now`, order preserved
pub fn recent_articles(articles: &[Article], window: Duration, now: DateTime<Utc>) -> Vec<Article> {
    articles
        .iter()
        .filter(|article| article.is_within(window, now))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(title: &str, published: Option<DateTime<Utc>>) -> Article {
        Article {
            title: title.to_string(),
            link: DEFAULT_LINK.to_string(),
            published,
            source: "test".to_string(),
        }
    }

    #[test]
    fn test_recent_articles_24h_window() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let articles = vec![
            article("now", Some(now)),
            article("23h", Some(now - Duration::hours(23))),
            article("25h", Some(now - Duration::hours(25))),
        ];

        let recent = recent_articles(&articles, Duration::hours(24), now);
        let titles: Vec<_> = recent.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["now", "23h"]);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let edge = article("edge", Some(now - Duration::hours(72)));
        assert!(edge.is_within(Duration::hours(72), now));
    }

    #[test]
    fn test_huge_window_admits_everything() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let ancient = article("ancient", Some(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap()));
        assert!(ancient.is_within(Duration::hours(i64::from(u32::MAX)), now));
        assert!(ancient.is_within(Duration::MAX, now));
        assert!(!article("undated", None).is_within(Duration::MAX, now));
    }

    #[test]
    fn test_dateless_article_is_never_recent() {
        let now = Utc::now();
        assert!(!article("undated", None).is_within(Duration::hours(72), now));
    }
}
