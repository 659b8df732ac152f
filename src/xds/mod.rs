//! Envoy Gateway extension hook implementation
//!
//! Envoy Gateway calls the extension server after translating Gateway API
//! resources into xDS. The server:
//! - decodes AI Gateway cluster names back to their `AIGatewayRoute` rule (`naming`)
//! - looks the route up through a bounded, cancellable resolver (`resolver`)
//! - writes per-endpoint backend metadata (`metadata`, `enricher`)
//! - adds the upstream external processor to enriched clusters (`upstream_filter`)
//! - serves the hook and gRPC health over tonic (`services`)

pub mod enricher;
pub mod metadata;
pub mod naming;
pub mod proto;
pub mod resolver;
pub mod services;
pub mod upstream_filter;

pub use enricher::ClusterEnricher;
pub use naming::{ClusterIdentity, DecodeError};
pub use resolver::{RouteNotFound, RouteResolver};
pub use services::{HealthService, HookService};

use crate::config::{Config, ServerConfig};
use crate::observability::MetricsRecorder;
use crate::storage::RouteStore;
use crate::Result;
use proto::HealthServer;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tonic::transport::server::Router;
use tonic::transport::Server;
use tracing::info;

/// Wire the enrichment pipeline from configuration.
pub fn hook_service(
    config: &Config,
    store: Arc<dyn RouteStore>,
    metrics: MetricsRecorder,
    shutdown: CancellationToken,
) -> HookService {
    let resolver = RouteResolver::new(store).with_timeout(config.resolver.lookup_timeout());
    let enricher = ClusterEnricher::new(resolver)
        .with_upstream_ext_proc(config.upstream_ext_proc.clone())
        .with_metrics(metrics);

    HookService::new(enricher).with_shutdown(shutdown)
}

/// gRPC router serving the extension hook and the health protocol.
pub fn router(hook: HookService) -> Router {
    Server::builder()
        .add_service(hook.into_server())
        .add_service(HealthServer::new(HealthService::new()))
}

/// Serve the extension server until `shutdown_signal` resolves.
pub async fn start_extension_server<F>(
    config: &ServerConfig,
    hook: HookService,
    shutdown_signal: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.bind_address()?;

    info!(address = %addr, "Extension server listening");

    router(hook).serve_with_shutdown(addr, shutdown_signal).await.map_err(|e| {
        let error_msg = e.to_string();
        if error_msg.contains("Address already in use") || error_msg.contains("bind") {
            crate::Error::transport(format!(
                "Extension server failed to bind to {}: Port {} is already in use",
                addr,
                addr.port()
            ))
        } else {
            crate::Error::from(e)
        }
    })?;

    info!("Extension server stopped");
    Ok(())
}
