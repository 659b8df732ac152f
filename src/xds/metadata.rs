//! Per-endpoint backend metadata.
//!
//! The upstream external processor reads `xds.upstream_host_metadata` to learn
//! which backend an endpoint belongs to. The data plane filter expects the
//! namespace key below byte for byte, including its spelling.

use envoy_types::pb::envoy::config::core::v3::Metadata;
use envoy_types::pb::envoy::config::endpoint::v3::LbEndpoint;
use envoy_types::pb::google::protobuf::{value::Kind, Value};

/// Filter metadata namespace read by the data plane.
pub const BACKEND_METADATA_NAMESPACE: &str = "aigateawy.envoy.io";

/// Field holding `<backendRefName>.<namespace>`.
pub const BACKEND_NAME_KEY: &str = "backend_name";

/// Value stored under [`BACKEND_NAME_KEY`] for a backend reference.
pub fn backend_name_value(backend_ref_name: &str, namespace: &str) -> String {
    format!("{}.{}", backend_ref_name, namespace)
}

/// Set the backend name on `endpoint`, creating the metadata containers on
/// demand. Other namespaces and fields are left untouched.
pub fn apply(endpoint: &mut LbEndpoint, backend_name: &str) {
    let metadata = endpoint.metadata.get_or_insert_with(Metadata::default);
    let fields = &mut metadata
        .filter_metadata
        .entry(BACKEND_METADATA_NAMESPACE.to_string())
        .or_default()
        .fields;

    fields.insert(
        BACKEND_NAME_KEY.to_string(),
        Value { kind: Some(Kind::StringValue(backend_name.to_string())) },
    );
}

/// Read back the backend name written by [`apply`].
pub fn backend_name(endpoint: &LbEndpoint) -> Option<&str> {
    let value = endpoint
        .metadata
        .as_ref()?
        .filter_metadata
        .get(BACKEND_METADATA_NAMESPACE)?
        .fields
        .get(BACKEND_NAME_KEY)?;

    match value.kind.as_ref()? {
        Kind::StringValue(name) => Some(name.as_str()),
        _ => None,
    }
}
