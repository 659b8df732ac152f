//! `envoygateway.extension.EnvoyGatewayExtension` hook service.
//!
//! Only `PostTranslateModify` is served. Every cluster of the request goes
//! through the [`ClusterEnricher`]; secrets, listeners and routes are echoed
//! back unchanged.

use crate::hook_span;
use crate::observability::{EnrichmentOutcome, MetricsRecorder};
use crate::xds::enricher::ClusterEnricher;
use crate::xds::naming;
use crate::xds::proto::{
    EnvoyGatewayExtension, EnvoyGatewayExtensionServer, PostTranslateModifyRequest,
    PostTranslateModifyResponse,
};
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use tracing::{debug, error, Instrument};

const POST_TRANSLATE_MODIFY: &str = "PostTranslateModify";

/// Extension hook facade around the cluster enricher.
#[derive(Clone)]
pub struct HookService {
    enricher: Arc<ClusterEnricher>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for HookService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookService")
            .field("enricher", &"Arc<ClusterEnricher>")
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl HookService {
    pub fn new(enricher: ClusterEnricher) -> Self {
        Self { enricher: Arc::new(enricher), shutdown: CancellationToken::new() }
    }

    /// Tie in-flight route lookups to `shutdown`.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn into_server(self) -> EnvoyGatewayExtensionServer<Self> {
        EnvoyGatewayExtensionServer::new(self)
    }

    fn metrics(&self) -> &MetricsRecorder {
        self.enricher.metrics()
    }

    /// Enrich every cluster of a batch in place.
    pub async fn modify_clusters(&self, clusters: &mut [Cluster]) {
        let cancel = self.shutdown.child_token();
        join_all(clusters.iter_mut().map(|cluster| self.enrich_isolated(cluster, &cancel))).await;
    }

    /// Run the enricher, restoring the cluster if it panics.
    async fn enrich_isolated(&self, cluster: &mut Cluster, cancel: &CancellationToken) {
        let original = rollback_snapshot(cluster);
        let outcome = AssertUnwindSafe(self.enricher.enrich(cluster, cancel)).catch_unwind().await;

        if outcome.is_err() {
            if let Some(original) = original {
                *cluster = original;
            }
            error!(cluster = %cluster.name, "recovered from panic while enriching cluster");
            self.metrics().record_enrichment(EnrichmentOutcome::Panicked);
        }
    }
}

/// Copy of `cluster` to restore after a panic.
///
/// Clusters whose names do not decode are rejected before anything is
/// mutated, so only AI Gateway rule clusters need one.
fn rollback_snapshot(cluster: &Cluster) -> Option<Cluster> {
    naming::decode(&cluster.name).is_ok().then(|| cluster.clone())
}

#[tonic::async_trait]
impl EnvoyGatewayExtension for HookService {
    async fn post_translate_modify(
        &self,
        request: Request<PostTranslateModifyRequest>,
    ) -> std::result::Result<Response<PostTranslateModifyResponse>, Status> {
        let request = request.into_inner();
        let span = hook_span!(POST_TRANSLATE_MODIFY, request.clusters.len());

        async move {
            let started = Instant::now();
            self.metrics().record_hook_request(POST_TRANSLATE_MODIFY);

            let PostTranslateModifyRequest { mut clusters, secrets, listeners, routes, .. } =
                request;
            self.modify_clusters(&mut clusters).await;

            let elapsed = started.elapsed();
            self.metrics().record_hook_duration(POST_TRANSLATE_MODIFY, elapsed.as_secs_f64());
            debug!(elapsed_ms = elapsed.as_millis() as u64, "PostTranslateModify completed");

            Ok(Response::new(PostTranslateModifyResponse { clusters, secrets, listeners, routes }))
        }
        .instrument(span)
        .await
    }
}
