//! # Structured Logging
//!
//! Subscriber setup and span helpers built on the tracing ecosystem.
//!
//! `RUST_LOG` takes precedence over the configured level so operators can
//! raise verbosity for a single module without touching the deployment.

use crate::config::{Config, ObservabilityConfig};
use crate::errors::{Error, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Create a tracing span for one extension hook invocation.
///
/// ```rust,ignore
/// let span = hook_span!("PostTranslateModify", request.clusters.len());
/// ```
#[macro_export]
macro_rules! hook_span {
    ($method:expr, $clusters:expr) => {
        tracing::info_span!(
            "extension_hook",
            method = %$method,
            request_id = %uuid::Uuid::new_v4(),
            clusters = $clusters
        )
    };
    ($method:expr, $clusters:expr, $($field:tt)*) => {
        tracing::info_span!(
            "extension_hook",
            method = %$method,
            request_id = %uuid::Uuid::new_v4(),
            clusters = $clusters,
            $($field)*
        )
    };
}

/// Build the level filter from `RUST_LOG` or the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(&config.log_level).map_err(|e| {
        Error::config(format!("Invalid log level '{}': {}", config.log_level, e))
    })
}

/// Install the global subscriber: pretty output by default, JSON when enabled.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    let installed = if config.json_logging {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    installed.map_err(|e| Error::internal(format!("Failed to install tracing subscriber: {}", e)))
}

/// Log configuration at startup
pub fn log_config_info(config: &Config) {
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        routes = ?config.resolver.manifest_path,
        lookup_timeout_ms = config.resolver.lookup_timeout_ms,
        cache_ttl_seconds = config.resolver.cache_ttl_seconds,
        upstream_ext_proc = config.upstream_ext_proc.enabled,
        metrics_enabled = config.observability.enable_metrics,
        "AI Gateway extension server configuration"
    );
}
