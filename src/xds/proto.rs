//! Wire messages for the extension and health services.
//!
//! The Envoy resources are reused from `envoy-types`; only the envelopes of
//! the Envoy Gateway extension API and `grpc.health.v1` are declared here.
//! Field tags match the upstream `.proto` definitions.

use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::listener::v3::Listener;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;
use envoy_types::pb::envoy::extensions::transport_sockets::tls::v3::Secret;
use std::collections::HashMap;

/// Raw Kubernetes object attached by Envoy Gateway to the hook context.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ExtensionResource {
    #[prost(bytes = "vec", tag = "1")]
    pub unstructured_bytes: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct PostTranslateExtensionContext {
    #[prost(message, repeated, tag = "1")]
    pub extension_resources: Vec<ExtensionResource>,
}

/// `envoygateway.extension.PostTranslateModifyRequest`
#[derive(Clone, PartialEq, prost::Message)]
pub struct PostTranslateModifyRequest {
    #[prost(message, optional, tag = "1")]
    pub post_translate_context: Option<PostTranslateExtensionContext>,
    #[prost(message, repeated, tag = "2")]
    pub clusters: Vec<Cluster>,
    #[prost(message, repeated, tag = "3")]
    pub secrets: Vec<Secret>,
    #[prost(message, repeated, tag = "4")]
    pub listeners: Vec<Listener>,
    #[prost(message, repeated, tag = "5")]
    pub routes: Vec<RouteConfiguration>,
}

/// `envoygateway.extension.PostTranslateModifyResponse`
#[derive(Clone, PartialEq, prost::Message)]
pub struct PostTranslateModifyResponse {
    #[prost(message, repeated, tag = "1")]
    pub clusters: Vec<Cluster>,
    #[prost(message, repeated, tag = "2")]
    pub secrets: Vec<Secret>,
    #[prost(message, repeated, tag = "3")]
    pub listeners: Vec<Listener>,
    #[prost(message, repeated, tag = "4")]
    pub routes: Vec<RouteConfiguration>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HealthCheckRequest {
    #[prost(string, tag = "1")]
    pub service: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HealthCheckResponse {
    #[prost(enumeration = "ServingStatus", tag = "1")]
    pub status: i32,
}

impl HealthCheckResponse {
    pub fn serving() -> Self {
        Self { status: ServingStatus::Serving as i32 }
    }
}

/// `grpc.health.v1.HealthCheckResponse.ServingStatus`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ServingStatus {
    Unknown = 0,
    Serving = 1,
    NotServing = 2,
    ServiceUnknown = 3,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HealthListRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct HealthListResponse {
    #[prost(map = "string, message", tag = "1")]
    pub statuses: HashMap<String, HealthCheckResponse>,
}

/// Generated `envoygateway.extension.EnvoyGatewayExtension` client and server.
#[allow(clippy::all)]
pub mod extension {
    include!(concat!(env!("OUT_DIR"), "/envoygateway.extension.EnvoyGatewayExtension.rs"));
}

/// Generated `grpc.health.v1.Health` client and server.
#[allow(clippy::all)]
pub mod health {
    include!(concat!(env!("OUT_DIR"), "/grpc.health.v1.Health.rs"));
}

pub use extension::envoy_gateway_extension_client::EnvoyGatewayExtensionClient;
pub use extension::envoy_gateway_extension_server::{
    EnvoyGatewayExtension, EnvoyGatewayExtensionServer,
};
pub use health::health_client::HealthClient;
pub use health::health_server::{Health, HealthServer};
