//! # Route Object Store
//!
//! Read-only access to `AIGatewayRoute` objects. The extension server never
//! writes routes; an external reconciler owns them. This module defines the
//! capability trait the resolver depends on plus the stores shipped with the
//! server:
//!
//! - [`InMemoryRouteStore`]: concurrent map, used in tests and as a snapshot holder
//! - [`ManifestRouteStore`]: reads Kubernetes-style manifests from disk
//! - [`CachedRouteStore`]: read-through TTL cache in front of any store

pub mod cache;
pub mod manifest;
pub mod memory;

pub use cache::CachedRouteStore;
pub use manifest::ManifestRouteStore;
pub use memory::InMemoryRouteStore;

use crate::config::ResolverConfig;
use crate::domain::{AIGatewayRoute, ObjectKey};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Errors produced by a route store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No route exists with the requested key
    #[error("AIGatewayRoute {key} not found")]
    NotFound { key: ObjectKey },

    /// The backing source could not be read
    #[error("failed to read route source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing source could not be decoded
    #[error("failed to decode route source {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },
}

impl StoreError {
    pub fn not_found(key: &ObjectKey) -> Self {
        Self::NotFound { key: key.clone() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Namespaced get-by-name access to routing resources.
///
/// Implementations must be safe to call from any number of concurrent tasks.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Fetch the committed snapshot of the route identified by `key`.
    async fn get(&self, key: &ObjectKey) -> Result<AIGatewayRoute, StoreError>;
}

/// Build the store described by `config`.
///
/// A manifest is read through a [`CachedRouteStore`] unless the TTL is zero.
/// Without a manifest every lookup misses, so no cluster is enriched.
pub fn route_store_from_config(config: &ResolverConfig) -> Arc<dyn RouteStore> {
    let Some(path) = &config.manifest_path else {
        warn!("No route manifest configured; AI Gateway clusters will not be enriched");
        return Arc::new(InMemoryRouteStore::new());
    };

    let manifest: Arc<dyn RouteStore> = Arc::new(ManifestRouteStore::new(path.clone()));
    if config.cache_ttl().is_zero() {
        manifest
    } else {
        Arc::new(CachedRouteStore::new(manifest, config.cache_ttl()))
    }
}
