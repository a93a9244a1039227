use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::Result;

/// Key/blob storage holding rendered artifacts
///
/// Implementations overwrite whole blobs atomically and maintain the
/// last-write timestamp themselves; callers never set it.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Last write time of `key`, `None` when the blob does not exist
    async fn last_modified(&self, key: &str) -> Result<Option<DateTime<Utc>>>;

    /// Full content of `key`, `None` when the blob does not exist
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Replace `key` with `body`
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    /// Human-readable location for logs (e.g., "s3://bucket")
    fn describe(&self) -> String;
}
