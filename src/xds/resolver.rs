//! Route resolution for the enricher.
//!
//! Every failure mode of a lookup (absent route, store error, timeout,
//! cancellation) collapses into [`RouteNotFound`]: the caller skips the
//! cluster either way and the next snapshot generation retries naturally.

use crate::domain::{AIGatewayRoute, ObjectKey};
use crate::storage::RouteStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default upper bound for a single route lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// The route could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("AIGatewayRoute {key} could not be resolved: {reason}")]
pub struct RouteNotFound {
    pub key: ObjectKey,
    pub reason: String,
}

impl RouteNotFound {
    fn new(key: &ObjectKey, reason: impl Into<String>) -> Self {
        Self { key: key.clone(), reason: reason.into() }
    }
}

/// Resolves `AIGatewayRoute` snapshots from an injected store.
#[derive(Clone)]
pub struct RouteResolver {
    store: Arc<dyn RouteStore>,
    timeout: Duration,
}

impl std::fmt::Debug for RouteResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteResolver")
            .field("store", &"Arc<dyn RouteStore>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RouteResolver {
    pub fn new(store: Arc<dyn RouteStore>) -> Self {
        Self { store, timeout: DEFAULT_LOOKUP_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the route `namespace/name`, giving up when `cancel` fires or the
    /// lookup timeout elapses.
    pub async fn resolve(
        &self,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<AIGatewayRoute, RouteNotFound> {
        let key = ObjectKey::new(namespace, name);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RouteNotFound::new(&key, "lookup cancelled")),
            result = tokio::time::timeout(self.timeout, self.store.get(&key)) => match result {
                Ok(Ok(route)) => Ok(route),
                Ok(Err(err)) => Err(RouteNotFound::new(&key, err.to_string())),
                Err(_) => Err(RouteNotFound::new(
                    &key,
                    format!("lookup timed out after {}ms", self.timeout.as_millis()),
                )),
            },
        }
    }
}
