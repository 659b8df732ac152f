//! Read-through route cache for reducing object store reads
//!
//! Keeps the most recently fetched snapshot of each route for a fixed TTL.
//! Misses and store errors are never cached, so a route that appears in the
//! store is picked up on the next lookup. Concurrent misses on one key share a
//! single fetch from the inner store.

use super::{RouteStore, StoreError};
use crate::domain::{AIGatewayRoute, ObjectKey};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::debug;

/// Cached route entry with insertion time
#[derive(Debug, Clone)]
struct CacheEntry {
    route: AIGatewayRoute,
    inserted_at: Instant,
}

/// TTL cache in front of another [`RouteStore`].
pub struct CachedRouteStore {
    inner: Arc<dyn RouteStore>,
    entries: DashMap<ObjectKey, CacheEntry>,
    in_flight: DashMap<ObjectKey, Arc<OnceCell<AIGatewayRoute>>>,
    ttl: Duration,
}

impl std::fmt::Debug for CachedRouteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRouteStore")
            .field("inner", &"Arc<dyn RouteStore>")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl CachedRouteStore {
    pub fn new(inner: Arc<dyn RouteStore>, ttl: Duration) -> Self {
        Self { inner, entries: DashMap::new(), in_flight: DashMap::new(), ttl }
    }

    /// Create a cache with the default TTL (5 seconds)
    pub fn with_default_ttl(inner: Arc<dyn RouteStore>) -> Self {
        Self::new(inner, Duration::from_secs(5))
    }

    fn cached(&self, key: &ObjectKey) -> Option<AIGatewayRoute> {
        let entry = self.entries.get(key)?;
        if entry.inserted_at.elapsed() < self.ttl {
            debug!(route = %key, "Cache hit for AIGatewayRoute");
            return Some(entry.route.clone());
        }
        drop(entry);

        debug!(route = %key, "Cache entry expired");
        self.entries.remove_if(key, |_, entry| entry.inserted_at.elapsed() >= self.ttl);
        None
    }

    /// Drop the cached snapshot of one route
    pub fn invalidate(&self, key: &ObjectKey) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RouteStore for CachedRouteStore {
    async fn get(&self, key: &ObjectKey) -> Result<AIGatewayRoute, StoreError> {
        if let Some(route) = self.cached(key) {
            return Ok(route);
        }

        let fetch = self.in_flight.entry(key.clone()).or_default().clone();
        let fetched = fetch.get_or_try_init(|| self.inner.get(key)).await.cloned();

        if let Ok(route) = &fetched {
            let entry = CacheEntry { route: route.clone(), inserted_at: Instant::now() };
            self.entries.insert(key.clone(), entry);
        }
        self.in_flight.remove_if(key, |_, current| Arc::ptr_eq(current, &fetch));
        fetched
    }
}
