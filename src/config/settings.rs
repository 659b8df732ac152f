//! # Configuration Settings
//!
//! Defines the configuration structure for the extension server.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Port Envoy Gateway is configured to dial by default.
pub const DEFAULT_PORT: u16 = 1063;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct Config {
    /// gRPC server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Route lookup configuration
    #[validate(nested)]
    pub resolver: ResolverConfig,

    /// Upstream external processor injection
    #[validate(nested)]
    pub upstream_ext_proc: UpstreamExtProcConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        if self.observability.enable_metrics && self.server.port == self.observability.metrics_port
        {
            return Err(Error::validation("Server and metrics ports cannot be the same"));
        }

        Ok(())
    }
}

/// gRPC server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, message = "Port must be between 1 and 65535"))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: DEFAULT_PORT }
    }
}

impl ServerConfig {
    /// Socket address the gRPC server binds to
    pub fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port).parse().map_err(|e| {
            Error::config(format!("Invalid bind address '{}:{}': {}", self.host, self.port, e))
        })
    }
}

/// Route lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolverConfig {
    /// Upper bound for a single route lookup in milliseconds
    #[validate(range(
        min = 1,
        max = 60000,
        message = "Lookup timeout must be between 1ms and 60s"
    ))]
    pub lookup_timeout_ms: u64,

    /// Route cache TTL in seconds (0 disables caching)
    #[validate(range(max = 3600, message = "Cache TTL must be at most 3600 seconds"))]
    pub cache_ttl_seconds: u64,

    /// Manifest file holding the `AIGatewayRoute` objects
    pub manifest_path: Option<PathBuf>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { lookup_timeout_ms: 5000, cache_ttl_seconds: 5, manifest_path: None }
    }
}

impl ResolverConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

/// Upstream external processor injected into enriched clusters
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpstreamExtProcConfig {
    /// Insert the filter into AI Gateway clusters
    pub enabled: bool,

    /// gRPC timeout of the processor call in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Ext proc timeout must be between 1 and 300 seconds"
    ))]
    pub timeout_seconds: u64,
}

impl Default for UpstreamExtProcConfig {
    fn default() -> Self {
        Self { enabled: true, timeout_seconds: 30 }
    }
}

impl UpstreamExtProcConfig {
    /// Configuration that leaves the protocol options untouched
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exporter
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: false,
            metrics_port: 9090,
            service_name: "aigw-extserver".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}
