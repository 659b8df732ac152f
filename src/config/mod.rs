//! # Configuration Management
//!
//! Configuration is read from `AIGW_*` environment variables (an optional
//! `.env` file is loaded first by the binary) and may then be overridden by
//! command line flags.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `AIGW_HOST` | `0.0.0.0` |
//! | `AIGW_PORT` | `1063` |
//! | `AIGW_LOOKUP_TIMEOUT_MS` | `5000` |
//! | `AIGW_CACHE_TTL_SECONDS` | `5` |
//! | `AIGW_ROUTES_PATH` | unset |
//! | `AIGW_UPSTREAM_EXTPROC_ENABLED` | `true` |
//! | `AIGW_UPSTREAM_EXTPROC_TIMEOUT_SECONDS` | `30` |
//! | `AIGW_LOG_LEVEL` | `info` |
//! | `AIGW_JSON_LOGS` | `false` |
//! | `AIGW_METRICS_ENABLED` | `false` |
//! | `AIGW_METRICS_PORT` | `9090` |
//! | `AIGW_SERVICE_NAME` | `aigw-extserver` |

pub mod settings;

pub use settings::{
    Config, ObservabilityConfig, ResolverConfig, ServerConfig, UpstreamExtProcConfig,
    DEFAULT_PORT,
};

use crate::errors::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let vars = Vars { lookup };

        let config = Config {
            server: ServerConfig {
                host: vars.string("AIGW_HOST").unwrap_or(defaults.server.host),
                port: vars.parse("AIGW_PORT")?.unwrap_or(defaults.server.port),
            },
            resolver: ResolverConfig {
                lookup_timeout_ms: vars
                    .parse("AIGW_LOOKUP_TIMEOUT_MS")?
                    .unwrap_or(defaults.resolver.lookup_timeout_ms),
                cache_ttl_seconds: vars
                    .parse("AIGW_CACHE_TTL_SECONDS")?
                    .unwrap_or(defaults.resolver.cache_ttl_seconds),
                manifest_path: vars
                    .string("AIGW_ROUTES_PATH")
                    .map(PathBuf::from)
                    .or(defaults.resolver.manifest_path),
            },
            upstream_ext_proc: UpstreamExtProcConfig {
                enabled: vars
                    .parse("AIGW_UPSTREAM_EXTPROC_ENABLED")?
                    .unwrap_or(defaults.upstream_ext_proc.enabled),
                timeout_seconds: vars
                    .parse("AIGW_UPSTREAM_EXTPROC_TIMEOUT_SECONDS")?
                    .unwrap_or(defaults.upstream_ext_proc.timeout_seconds),
            },
            observability: ObservabilityConfig {
                enable_metrics: vars
                    .parse("AIGW_METRICS_ENABLED")?
                    .unwrap_or(defaults.observability.enable_metrics),
                metrics_port: vars
                    .parse("AIGW_METRICS_PORT")?
                    .unwrap_or(defaults.observability.metrics_port),
                service_name: vars
                    .string("AIGW_SERVICE_NAME")
                    .unwrap_or(defaults.observability.service_name),
                log_level: vars
                    .string("AIGW_LOG_LEVEL")
                    .unwrap_or(defaults.observability.log_level),
                json_logging: vars
                    .parse("AIGW_JSON_LOGS")?
                    .unwrap_or(defaults.observability.json_logging),
            },
        };

        Ok(config)
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|e| Error::config(format!("Invalid {} '{}': {}", key, raw, e)))
            })
            .transpose()
    }
}
