use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Duration;

use super::store::BlobStore;
use crate::clock::Clock;
use crate::Result;

/// Content type stored with every rendered artifact
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Absent,
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
            Freshness::Absent => "absent",
        };
        f.write_str(name)
    }
}

/// Outcome of reading a named artifact
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Written less than one freshness window ago
    Fresh { content: Bytes, age: Duration },
    /// Written at least one freshness window ago; still served
    Stale { content: Bytes, age: Duration },
    /// Never written, or the store could not tell us
    Absent,
}

impl CacheLookup {
    pub fn freshness(&self) -> Freshness {
        match self {
            CacheLookup::Fresh { .. } => Freshness::Fresh,
            CacheLookup::Stale { .. } => Freshness::Stale,
            CacheLookup::Absent => Freshness::Absent,
        }
    }

    pub fn content(&self) -> Option<&Bytes> {
        match self {
            CacheLookup::Fresh { content, .. } | CacheLookup::Stale { content, .. } => Some(content),
            CacheLookup::Absent => None,
        }
    }

    pub fn into_content(self) -> Option<Bytes> {
        match self {
            CacheLookup::Fresh { content, .. } | CacheLookup::Stale { content, .. } => Some(content),
            CacheLookup::Absent => None,
        }
    }

    /// Time since the last write; negative when the store clock runs ahead
    pub fn age(&self) -> Option<Duration> {
        match self {
            CacheLookup::Fresh { age, .. } | CacheLookup::Stale { age, .. } => Some(*age),
            CacheLookup::Absent => None,
        }
    }
}

/// Named rendered pages on top of a blob store, classified by age
///
/// Reads never fail: any store error while looking up an artifact is
/// logged and reported as `Absent`. Reads never trigger regeneration.
pub struct ArtifactCache {
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl ArtifactCache {
    pub fn new(store: Arc<dyn BlobStore>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            store,
            clock,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub async fn read(&self, name: &str) -> CacheLookup {
        let last_write = match self.store.last_modified(name).await {
            Ok(Some(at)) => at,
            Ok(None) => {
                tracing::debug!(artifact = name, "Artifact not written yet");
                return CacheLookup::Absent;
            }
            Err(e) => {
                tracing::warn!(artifact = name, error = %e, "Cannot read artifact metadata, treating as absent");
                return CacheLookup::Absent;
            }
        };

        let content = match self.store.get(name).await {
            Ok(Some(content)) => content,
            Ok(None) => {
                // Deleted between the metadata lookup and the download
                tracing::debug!(artifact = name, "Artifact disappeared during read");
                return CacheLookup::Absent;
            }
            Err(e) => {
                tracing::warn!(artifact = name, error = %e, "Cannot download artifact, treating as absent");
                return CacheLookup::Absent;
            }
        };

        let age = self.clock.now() - last_write;
        let lookup = if age < self.window {
            CacheLookup::Fresh { content, age }
        } else {
            CacheLookup::Stale { content, age }
        };

        tracing::debug!(
            artifact = name,
            state = %lookup.freshness(),
            age_secs = age.num_seconds(),
            "Artifact read"
        );
        lookup
    }

    /// Overwrite `name`; the store records the new last-write time
    pub async fn write(&self, name: &str, content: &str) -> Result<()> {
        self.store
            .put(name, Bytes::copy_from_slice(content.as_bytes()), HTML_CONTENT_TYPE)
            .await?;
        tracing::info!(
            artifact = name,
            bytes = content.len(),
            store = %self.store.describe(),
            "Artifact written"
        );
        Ok(())
    }
}
