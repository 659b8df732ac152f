//! Upstream external processor injection.
//!
//! AI Gateway clusters carry an upstream HTTP filter chain in their
//! `HttpProtocolOptions`. The external processor registered there runs after
//! endpoint selection, so it sees the `backend_name` host metadata written by
//! the enricher. This module decodes the options, inserts the filter ahead of
//! the terminal upstream codec, and re-encodes them.

use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::core::v3::grpc_service::{EnvoyGrpc, TargetSpecifier};
use envoy_types::pb::envoy::config::core::v3::{GrpcService, Http1ProtocolOptions};
use envoy_types::pb::envoy::extensions::filters::http::ext_proc::v3::{
    metadata_options::MetadataNamespaces,
    processing_mode::{BodySendMode, HeaderSendMode},
    ExternalProcessor, MetadataOptions, ProcessingMode,
};
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_filter::ConfigType, HttpFilter,
};
use envoy_types::pb::envoy::extensions::upstreams::http::v3::{
    http_protocol_options::{
        explicit_http_config::ProtocolConfig, ExplicitHttpConfig, UpstreamProtocolOptions,
    },
    HttpProtocolOptions,
};
use envoy_types::pb::google::protobuf::{Any, Duration as ProtoDuration};
use prost::Message;
use std::time::Duration;

/// Key of the upstream HTTP options in `typed_extension_protocol_options`.
pub const HTTP_PROTOCOL_OPTIONS_KEY: &str =
    "envoy.extensions.upstreams.http.v3.HttpProtocolOptions";
const HTTP_PROTOCOL_OPTIONS_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.upstreams.http.v3.HttpProtocolOptions";

/// Name of the injected upstream filter.
pub const EXT_PROC_FILTER_NAME: &str = "envoy.filters.http.ext_proc/aigateway";
const EXT_PROC_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.http.ext_proc.v3.ExternalProcessor";

/// Terminal filter of every upstream HTTP filter chain.
pub const UPSTREAM_CODEC_FILTER_NAME: &str = "envoy.filters.http.upstream_codec";
const UPSTREAM_CODEC_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.http.upstream_codec.v3.UpstreamCodec";

/// Attribute exposing the selected endpoint's metadata to the processor.
pub const UPSTREAM_HOST_METADATA_ATTRIBUTE: &str = "xds.upstream_host_metadata";

/// Dynamic metadata namespace the processor may write back into.
pub const EXT_PROC_METADATA_NAMESPACE: &str = "io.envoy.ai_gateway";

/// Default gRPC timeout of the upstream processor.
pub const DEFAULT_EXT_PROC_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InjectError {
    #[error("failed to unmarshal HttpProtocolOptions: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Cluster of the per-route external processor provisioned by the gateway.
pub fn ext_proc_cluster_name(namespace: &str, route_name: &str) -> String {
    format!("envoyextensionpolicy/{}/ai-eg-route-extproc-{}/extproc/0", namespace, route_name)
}

/// Make sure `cluster` runs the AI Gateway external processor upstream.
///
/// Returns `Ok(true)` when the cluster was changed and `Ok(false)` when the
/// filter was already present. A decode failure leaves the cluster untouched.
pub fn ensure_ext_proc_filter(
    cluster: &mut Cluster,
    namespace: &str,
    route_name: &str,
    timeout: Duration,
) -> Result<bool, InjectError> {
    let existing = cluster.typed_extension_protocol_options.get(HTTP_PROTOCOL_OPTIONS_KEY);
    let mut options = match existing {
        Some(any) => HttpProtocolOptions::decode(any.value.as_slice())?,
        None => default_protocol_options(),
    };

    if options.http_filters.iter().any(|filter| filter.name == EXT_PROC_FILTER_NAME) {
        return Ok(false);
    }

    let filter = ext_proc_filter(namespace, route_name, timeout);
    if options.http_filters.is_empty() {
        options.http_filters.push(filter);
        options.http_filters.push(upstream_codec_filter());
    } else {
        let codec_index = options.http_filters.len() - 1;
        options.http_filters.insert(codec_index, filter);
    }

    cluster.typed_extension_protocol_options.insert(
        HTTP_PROTOCOL_OPTIONS_KEY.to_string(),
        Any {
            type_url: HTTP_PROTOCOL_OPTIONS_TYPE_URL.to_string(),
            value: options.encode_to_vec(),
        },
    );

    Ok(true)
}

/// Build the upstream external processor filter for one route.
pub fn ext_proc_filter(namespace: &str, route_name: &str, timeout: Duration) -> HttpFilter {
    let grpc_service = GrpcService {
        target_specifier: Some(TargetSpecifier::EnvoyGrpc(EnvoyGrpc {
            cluster_name: ext_proc_cluster_name(namespace, route_name),
            ..Default::default()
        })),
        timeout: Some(ProtoDuration {
            seconds: timeout.as_secs() as i64,
            nanos: timeout.subsec_nanos() as i32,
        }),
        ..Default::default()
    };

    let processor = ExternalProcessor {
        grpc_service: Some(grpc_service),
        allow_mode_override: true,
        request_attributes: vec![UPSTREAM_HOST_METADATA_ATTRIBUTE.to_string()],
        processing_mode: Some(ProcessingMode {
            request_header_mode: HeaderSendMode::Send as i32,
            request_body_mode: BodySendMode::Buffered as i32,
            response_header_mode: HeaderSendMode::Send as i32,
            response_body_mode: BodySendMode::Buffered as i32,
            ..Default::default()
        }),
        metadata_options: Some(MetadataOptions {
            receiving_namespaces: Some(MetadataNamespaces {
                untyped: vec![EXT_PROC_METADATA_NAMESPACE.to_string()],
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };

    HttpFilter {
        name: EXT_PROC_FILTER_NAME.to_string(),
        config_type: Some(ConfigType::TypedConfig(Any {
            type_url: EXT_PROC_TYPE_URL.to_string(),
            value: processor.encode_to_vec(),
        })),
        ..Default::default()
    }
}

fn upstream_codec_filter() -> HttpFilter {
    // UpstreamCodec has no fields; its encoding is empty.
    HttpFilter {
        name: UPSTREAM_CODEC_FILTER_NAME.to_string(),
        config_type: Some(ConfigType::TypedConfig(Any {
            type_url: UPSTREAM_CODEC_TYPE_URL.to_string(),
            value: Vec::new(),
        })),
        ..Default::default()
    }
}

fn default_protocol_options() -> HttpProtocolOptions {
    HttpProtocolOptions {
        upstream_protocol_options: Some(UpstreamProtocolOptions::ExplicitHttpConfig(
            ExplicitHttpConfig {
                protocol_config: Some(ProtocolConfig::HttpProtocolOptions(
                    Http1ProtocolOptions::default(),
                )),
            },
        )),
        ..Default::default()
    }
}
