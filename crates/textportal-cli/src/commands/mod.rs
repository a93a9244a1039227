pub mod regenerate;
pub mod serve;
pub mod status;
pub mod trigger_payload;

use std::sync::Arc;

use anyhow::Result;

use textportal_core::{
    cache::build_store, ArtifactCache, AppConfig, Clock, RegenerationJob, SystemClock,
};

/// Cache and job wired to the configured store
pub struct Portal {
    pub cache: Arc<ArtifactCache>,
    pub job: Arc<RegenerationJob>,
}

impl Portal {
    pub async fn assemble(config: &AppConfig) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let store = build_store(config, Arc::clone(&clock)).await?;
        let cache = Arc::new(ArtifactCache::new(
            store,
            Arc::clone(&clock),
            config.cache.freshness_window(),
        ));
        let job = Arc::new(RegenerationJob::from_config(config, Arc::clone(&cache), clock)?);

        Ok(Self { cache, job })
    }
}
