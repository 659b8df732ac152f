//! Route store reading `AIGatewayRoute` manifests from disk.
//!
//! The manifest file is the source of truth maintained by whatever process
//! renders the routes (for example a reconciler writing into a mounted
//! volume). It is re-read on every lookup, so it should normally sit behind a
//! [`CachedRouteStore`](super::CachedRouteStore).

use super::{RouteStore, StoreError};
use crate::domain::{AIGatewayRoute, ObjectKey, AI_GATEWAY_ROUTE_KIND};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed route store.
#[derive(Debug, Clone)]
pub struct ManifestRouteStore {
    path: PathBuf,
}

impl ManifestRouteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode every `AIGatewayRoute` document in the manifest.
    pub async fn load(&self) -> Result<Vec<AIGatewayRoute>, StoreError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;

        parse_manifest(&raw)
            .map_err(|message| StoreError::Decode { path: self.path.clone(), message })
    }
}

#[async_trait]
impl RouteStore for ManifestRouteStore {
    async fn get(&self, key: &ObjectKey) -> Result<AIGatewayRoute, StoreError> {
        let routes = self.load().await?;
        debug!(path = %self.path.display(), routes = routes.len(), "Loaded route manifest");

        routes
            .into_iter()
            .find(|route| route.key() == *key)
            .ok_or_else(|| StoreError::not_found(key))
    }
}

/// Parse a multi-document YAML (or single JSON) manifest.
///
/// Empty documents, documents of other kinds and `AIGatewayRoute` documents
/// that do not decode are skipped. Only invalid YAML fails the whole manifest.
pub fn parse_manifest(raw: &str) -> Result<Vec<AIGatewayRoute>, String> {
    let mut routes = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(raw).enumerate() {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| e.to_string())?;
        if value.is_null() {
            continue;
        }

        let kind = value.get("kind").and_then(serde_yaml::Value::as_str);
        if kind != Some(AI_GATEWAY_ROUTE_KIND) {
            continue;
        }

        match serde_yaml::from_value::<AIGatewayRoute>(value) {
            Ok(route) => routes.push(route),
            Err(e) => {
                warn!(document = index, error = %e, "Skipping invalid AIGatewayRoute document")
            }
        }
    }

    Ok(routes)
}
