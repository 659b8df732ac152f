//! Common test utilities for all integration tests.
//!
//! Starts the extension server on a loopback listener and hands out clients.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use aigw_extserver::observability::MetricsRecorder;
use aigw_extserver::storage::RouteStore;
use aigw_extserver::xds::{self, proto::EnvoyGatewayExtensionClient, proto::HealthClient};
use aigw_extserver::Config;
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::endpoint::v3::{
    ClusterLoadAssignment, LbEndpoint, LocalityLbEndpoints,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;

/// Extension server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), tonic::transport::Error>>,
}

impl TestServer {
    pub async fn start(store: Arc<dyn RouteStore>) -> Self {
        Self::start_with_config(&Config::default(), store).await
    }

    pub async fn start_with_config(config: &Config, store: Arc<dyn RouteStore>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback listener");
        let addr = listener.local_addr().expect("local addr");

        let shutdown = CancellationToken::new();
        let hook = xds::hook_service(config, store, MetricsRecorder::new(), shutdown.clone());
        let signal = shutdown.clone();
        let handle = tokio::spawn(xds::router(hook).serve_with_incoming_shutdown(
            TcpListenerStream::new(listener),
            async move { signal.cancelled().await },
        ));

        Self { addr, shutdown, handle }
    }

    fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn extension_client(&self) -> EnvoyGatewayExtensionClient<Channel> {
        EnvoyGatewayExtensionClient::connect(self.endpoint()).await.expect("connect extension")
    }

    pub async fn health_client(&self) -> HealthClient<Channel> {
        HealthClient::connect(self.endpoint()).await.expect("connect health")
    }

    pub async fn stop(self) {
        self.shutdown.cancel();
        self.handle.await.expect("server task").expect("server exits cleanly");
    }
}

/// Cluster with one locality per entry of `localities`, each holding that
/// many endpoints.
pub fn cluster(name: &str, localities: &[usize]) -> Cluster {
    Cluster {
        name: name.to_string(),
        load_assignment: Some(ClusterLoadAssignment {
            cluster_name: name.to_string(),
            endpoints: localities
                .iter()
                .map(|&count| LocalityLbEndpoints {
                    lb_endpoints: vec![LbEndpoint::default(); count],
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Backend names written on the flattened endpoints of `cluster`.
pub fn backend_names(cluster: &Cluster) -> Vec<Option<String>> {
    cluster
        .load_assignment
        .iter()
        .flat_map(|la| la.endpoints.iter())
        .flat_map(|locality| locality.lb_endpoints.iter())
        .map(|endpoint| {
            aigw_extserver::xds::metadata::backend_name(endpoint).map(str::to_string)
        })
        .collect()
}
