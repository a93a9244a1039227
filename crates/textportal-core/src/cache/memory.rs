//! In-process blob store
//!
//! Used for local development (`storage.backend = "memory"`) and as the
//! store double in tests. Failures can be injected per key to exercise the
//! degraded paths of the cache and the regeneration job.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::store::BlobStore;
use crate::clock::Clock;
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct StoredBlob {
    body: Bytes,
    content_type: String,
    last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    blobs: HashMap<String, StoredBlob>,
    failing_writes: HashSet<String>,
    failing_metadata: HashSet<String>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            clock,
        }
    }

    /// Make every subsequent `put` to `key` fail
    pub fn fail_writes_to(&self, key: &str) {
        self.lock().failing_writes.insert(key.to_string());
    }

    /// Make every subsequent `last_modified` for `key` fail
    pub fn fail_metadata_for(&self, key: &str) {
        self.lock().failing_metadata.insert(key.to_string());
    }

    /// Remove all injected failures
    pub fn heal(&self) {
        let mut inner = self.lock();
        inner.failing_writes.clear();
        inner.failing_metadata.clear();
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock().blobs.get(key).map(|blob| blob.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryStore {
    async fn last_modified(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let inner = self.lock();
        if inner.failing_metadata.contains(key) {
            return Err(Error::Storage(format!("metadata lookup failed for {}", key)));
        }
        Ok(inner.blobs.get(key).map(|blob| blob.last_modified))
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.lock().blobs.get(key).map(|blob| blob.body.clone()))
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        let now = self.clock.now();
        let mut inner = self.lock();

        if inner.failing_writes.contains(key) {
            return Err(Error::Storage(format!("write rejected for {}", key)));
        }

        // Last-write time never moves backwards, even if the clock does
        let last_modified = inner
            .blobs
            .get(key)
            .map(|previous| previous.last_modified.max(now))
            .unwrap_or(now);

        inner.blobs.insert(
            key.to_string(),
            StoredBlob {
                body,
                content_type: content_type.to_string(),
                last_modified,
            },
        );
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = MemoryStore::new(clock);

        assert_eq!(store.get("index.html").await.unwrap(), None);
        assert_eq!(store.last_modified("index.html").await.unwrap(), None);

        store
            .put("index.html", Bytes::from_static(b"<p>hi</p>"), "text/html")
            .await
            .unwrap();

        assert_eq!(
            store.get("index.html").await.unwrap(),
            Some(Bytes::from_static(b"<p>hi</p>"))
        );
        assert_eq!(store.last_modified("index.html").await.unwrap(), Some(start()));
        assert_eq!(store.content_type("index.html").as_deref(), Some("text/html"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_last_modified_is_monotonic() {
        let clock = Arc::new(ManualClock::new(start()));
        let store = MemoryStore::new(clock.clone());

        store.put("a", Bytes::from_static(b"1"), "text/html").await.unwrap();
        clock.set(start() - Duration::hours(1));
        store.put("a", Bytes::from_static(b"2"), "text/html").await.unwrap();

        assert_eq!(store.last_modified("a").await.unwrap(), Some(start()));
        assert_eq!(store.get("a").await.unwrap(), Some(Bytes::from_static(b"2")));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new(Arc::new(ManualClock::new(start())));
        store.fail_writes_to("a");
        store.fail_metadata_for("b");

        assert!(store.put("a", Bytes::new(), "text/html").await.is_err());
        assert!(store.last_modified("b").await.is_err());
        assert!(store.is_empty());

        store.heal();
        assert!(store.put("a", Bytes::new(), "text/html").await.is_ok());
        assert!(store.last_modified("b").await.is_ok());
    }
}
