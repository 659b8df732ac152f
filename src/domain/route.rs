//! AIGatewayRoute domain types
//!
//! This module contains the read-only view of the `AIGatewayRoute` routing
//! resource. The resource is authored by users and reconciled elsewhere; the
//! extension server only ever reads committed snapshots of it.
//!
//! The shapes mirror the Kubernetes manifest layout so that route objects can
//! be deserialized directly from YAML or JSON documents.

use serde::{Deserialize, Serialize};
use std::fmt;

/// API group/version of the `AIGatewayRoute` resource.
pub const AI_GATEWAY_ROUTE_API_VERSION: &str = "aigateway.envoyproxy.io/v1alpha1";

/// Kind of the `AIGatewayRoute` resource.
pub const AI_GATEWAY_ROUTE_KIND: &str = "AIGatewayRoute";

/// Namespace used when a manifest omits `metadata.namespace`.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Namespaced identity of a routing resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Object metadata subset relevant to route lookups.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// A declarative AI Gateway route: an ordered list of rules, each pointing
/// at an ordered list of backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIGatewayRoute {
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_kind")]
    pub kind: String,

    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: AIGatewayRouteSpec,
}

fn default_api_version() -> String {
    AI_GATEWAY_ROUTE_API_VERSION.to_string()
}

fn default_kind() -> String {
    AI_GATEWAY_ROUTE_KIND.to_string()
}

/// Route specification. Rule order is significant: rule indices are embedded
/// in the names of the clusters generated for this route.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIGatewayRouteSpec {
    #[serde(default)]
    pub rules: Vec<AIGatewayRouteRule>,
}

/// A single routing rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIGatewayRouteRule {
    /// Backends in the order their endpoints appear in the generated cluster.
    #[serde(default)]
    pub backend_refs: Vec<AIGatewayRouteRuleBackendRef>,
}

/// Reference to an `AIServiceBackend` in the route's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIGatewayRouteRuleBackendRef {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

impl AIGatewayRouteRuleBackendRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

impl AIGatewayRoute {
    /// Build a route with the given rules, each rule listing its backend names.
    pub fn new<I, R, S>(namespace: impl Into<String>, name: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rules = rules
            .into_iter()
            .map(|backends| AIGatewayRouteRule {
                backend_refs: backends
                    .into_iter()
                    .map(AIGatewayRouteRuleBackendRef::new)
                    .collect(),
            })
            .collect();

        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            metadata: ObjectMeta { name: name.into(), namespace: Some(namespace.into()) },
            spec: AIGatewayRouteSpec { rules },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Namespace of the route, falling back to [`DEFAULT_NAMESPACE`].
    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace(), self.name())
    }

    pub fn rules(&self) -> &[AIGatewayRouteRule] {
        &self.spec.rules
    }

    pub fn rule(&self, index: usize) -> Option<&AIGatewayRouteRule> {
        self.spec.rules.get(index)
    }
}
