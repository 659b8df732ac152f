//! Domain layer
//!
//! This module contains the routing model that the extension server projects
//! onto generated Envoy clusters. Domain types have no dependency on the
//! object store or on the xDS wire types.
//!
//! ## Module Organization
//!
//! - `route`: `AIGatewayRoute` and its ordered rules and backend references

pub mod route;

pub use route::{
    AIGatewayRoute, AIGatewayRouteRule, AIGatewayRouteRuleBackendRef, AIGatewayRouteSpec,
    ObjectKey, ObjectMeta, AI_GATEWAY_ROUTE_API_VERSION, AI_GATEWAY_ROUTE_KIND, DEFAULT_NAMESPACE,
};
