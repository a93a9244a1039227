use std::sync::Arc;

use tokio::task::JoinSet;

use super::models::Article;
use super::parser::parse_feed;
use crate::fetch::{ResilientFetcher, RetryPolicy};

/// Fetches every configured feed and merges the entries into one timeline
pub struct FeedAggregator {
    fetcher: Arc<ResilientFetcher>,
    policy: RetryPolicy,
    concurrency: usize,
}

impl FeedAggregator {
    pub fn new(fetcher: Arc<ResilientFetcher>, policy: RetryPolicy, concurrency: usize) -> Self {
        Self {
            fetcher,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    /// Articles from every reachable feed, newest first
    ///
    /// A feed that cannot be fetched or parsed is logged and skipped. Per-feed
    /// results are concatenated in `feed_urls` order before the stable sort,
    /// so the output does not depend on which fetch finished first.
    pub async fn aggregate_all(&self, feed_urls: &[String]) -> Vec<Article> {
        let mut per_feed: Vec<Vec<Article>> = vec![Vec::new(); feed_urls.len()];
        let mut join_set: JoinSet<(usize, Vec<Article>)> = JoinSet::new();
        let mut pending = feed_urls.iter().cloned().enumerate();

        for _ in 0..self.concurrency {
            self.spawn_next(&mut join_set, &mut pending);
        }

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((index, articles)) => per_feed[index] = articles,
                Err(e) => tracing::error!(error = %e, "Feed task failed"),
            }
            self.spawn_next(&mut join_set, &mut pending);
        }

        merge_timeline(per_feed.into_iter().flatten().collect())
    }

    fn spawn_next(
        &self,
        join_set: &mut JoinSet<(usize, Vec<Article>)>,
        pending: &mut impl Iterator<Item = (usize, String)>,
    ) {
        if let Some((index, url)) = pending.next() {
            let fetcher = Arc::clone(&self.fetcher);
            let policy = self.policy;
            join_set.spawn(async move { (index, fetch_feed(&fetcher, &url, &policy).await) });
        }
    }
}

/// Fetch and parse one feed; failures yield no articles
async fn fetch_feed(fetcher: &ResilientFetcher, url: &str, policy: &RetryPolicy) -> Vec<Article> {
    tracing::info!(url, "Fetching feed");

    let content = match fetcher.fetch(url, policy).await {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(url, error = %e, "Skipping feed due to fetch error");
            return Vec::new();
        }
    };

    match parse_feed(content.as_bytes(), url) {
        Ok(parsed) => {
            tracing::info!(url, entries = parsed.articles.len(), "Parsed feed");
            parsed.articles
        }
        Err(e) => {
            tracing::error!(url, error = %e, "Skipping feed due to parse error");
            Vec::new()
        }
    }
}

/// Drop dateless articles, then stable-sort newest first
pub fn merge_timeline(articles: Vec<Article>) -> Vec<Article> {
    let mut dated: Vec<Article> = articles
        .into_iter()
        .filter(|article| article.published.is_some())
        .collect();

    dated.sort_by(|a, b| b.published.cmp(&a.published));
    dated
}
