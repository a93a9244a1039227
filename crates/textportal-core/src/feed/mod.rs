mod aggregator;
mod models;
mod parser;

pub use aggregator::{merge_timeline, FeedAggregator};
pub use models::{recent_articles, Article, DEFAULT_LINK, DEFAULT_TITLE};
pub use parser::{parse_feed, ParsedFeed};
