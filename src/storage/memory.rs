//! In-memory route store backed by `DashMap`.

use super::{RouteStore, StoreError};
use crate::domain::{AIGatewayRoute, ObjectKey};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Concurrent in-memory store of routes keyed by namespace and name.
///
/// Cloning the store is cheap and clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRouteStore {
    routes: Arc<DashMap<ObjectKey, AIGatewayRoute>>,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `routes`.
    pub fn with_routes(routes: impl IntoIterator<Item = AIGatewayRoute>) -> Self {
        let store = Self::new();
        for route in routes {
            store.insert(route);
        }
        store
    }

    /// Insert or replace a route, returning the previous snapshot if any.
    pub fn insert(&self, route: AIGatewayRoute) -> Option<AIGatewayRoute> {
        self.routes.insert(route.key(), route)
    }

    pub fn remove(&self, key: &ObjectKey) -> Option<AIGatewayRoute> {
        self.routes.remove(key).map(|(_, route)| route)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn get(&self, key: &ObjectKey) -> Result<AIGatewayRoute, StoreError> {
        self.routes
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::not_found(key))
    }
}
