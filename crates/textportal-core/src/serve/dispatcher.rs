use std::sync::Arc;

use super::protocol::{decode_trigger, InboundRequest, OutboundResponse, UNAVAILABLE_MESSAGE};
use crate::cache::{ArtifactCache, CacheLookup};
use crate::regen::Regenerator;

/// Routes each request to a regeneration run or to a cached page
pub struct ServingDispatcher {
    cache: Arc<ArtifactCache>,
    regenerator: Arc<dyn Regenerator>,
    front_page_key: String,
    archive_key: String,
    route_prefix: String,
}

impl ServingDispatcher {
    pub fn new(
        cache: Arc<ArtifactCache>,
        regenerator: Arc<dyn Regenerator>,
        front_page_key: impl Into<String>,
        archive_key: impl Into<String>,
        route_prefix: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            regenerator,
            front_page_key: front_page_key.into(),
            archive_key: archive_key.into(),
            route_prefix: route_prefix.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn handle(&self, request: InboundRequest) -> OutboundResponse {
        if request.is_post() && !request.body.is_empty() {
            match decode_trigger(&request.body) {
                Ok(()) => return self.regenerate().await,
                Err(e) => {
                    tracing::warn!(path = %request.path, error = %e, "Ignoring malformed trigger, serving page")
                }
            }
        }

        self.serve(&request.path).await
    }

    async fn regenerate(&self) -> OutboundResponse {
        tracing::info!("Regeneration triggered");
        match self.regenerator.run().await {
            Ok(report) => {
                tracing::info!(run_id = %report.run_id, "Triggered regeneration succeeded");
                OutboundResponse::text(200, "Success!")
            }
            Err(e) => {
                tracing::error!(error = %e, "Triggered regeneration failed");
                OutboundResponse::text(500, "Error!")
            }
        }
    }

    async fn serve(&self, path: &str) -> OutboundResponse {
        let artifact = self.resolve_artifact(path);
        let lookup = self.cache.read(artifact).await;
        tracing::info!(path, artifact, state = %lookup.freshness(), "Serving page");

        match lookup {
            CacheLookup::Fresh { content, .. } | CacheLookup::Stale { content, .. } => {
                OutboundResponse::html(content)
            }
            CacheLookup::Absent => OutboundResponse::text(200, UNAVAILABLE_MESSAGE),
        }
    }

    /// Artifact key for a request path: root is the front page, anything else the archive
    pub fn resolve_artifact(&self, path: &str) -> &str {
        let path = path.split_once('?').map_or(path, |(before, _)| before);

        let path = if self.route_prefix.is_empty() {
            path
        } else {
            path.strip_prefix(self.route_prefix.as_str())
                .filter(|rest| rest.is_empty() || rest.starts_with('/'))
                .unwrap_or(path)
        };

        if path.is_empty() || path == "/" {
            &self.front_page_key
        } else {
            &self.archive_key
        }
    }
}
