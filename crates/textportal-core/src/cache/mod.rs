mod artifact;
mod local;
mod memory;
mod s3;
mod store;

use std::sync::Arc;

pub use artifact::{ArtifactCache, CacheLookup, Freshness, HTML_CONTENT_TYPE};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use s3::S3Store;
pub use store::BlobStore;

use crate::clock::Clock;
use crate::config::AppConfig;
use crate::{Error, Result};

/// Construct the blob store selected by `storage.backend`
pub async fn build_store(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Arc<dyn BlobStore>> {
    let store: Arc<dyn BlobStore> = match config.storage.backend.as_str() {
        "s3" => Arc::new(S3Store::new(&config.storage).await),
        "local" => Arc::new(LocalStore::new(config.local_dir())),
        "memory" => {
            tracing::warn!("Using in-memory storage; artifacts are lost on exit");
            Arc::new(MemoryStore::new(clock))
        }
        other => {
            return Err(Error::Config(format!("Unknown storage backend: {}", other)));
        }
    };

    tracing::info!(store = %store.describe(), "Artifact store ready");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    #[tokio::test]
    async fn test_build_store_by_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();

        config.storage.backend = "memory".to_string();
        let store = build_store(&config, Arc::new(SystemClock)).await.unwrap();
        assert_eq!(store.describe(), "memory");

        config.storage.backend = "local".to_string();
        config.storage.local_dir = dir.path().to_path_buf();
        let store = build_store(&config, Arc::new(SystemClock)).await.unwrap();
        assert_eq!(store.describe(), format!("local:{}", dir.path().display()));

        config.storage.backend = "nfs".to_string();
        assert!(build_store(&config, Arc::new(SystemClock)).await.is_err());
    }
}
