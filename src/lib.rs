//! # aigw-extserver
//!
//! Envoy Gateway extension server for the AI Gateway. Envoy Gateway calls the
//! `PostTranslateModify` hook with the clusters it generated; clusters that
//! belong to an `AIGatewayRoute` rule get per-endpoint backend metadata and an
//! upstream external processor, everything else passes through untouched.
//!
//! ## Architecture
//!
//! ```text
//! Envoy Gateway ──gRPC──▶ HookService ──▶ ClusterEnricher ──▶ RouteResolver ──▶ RouteStore
//!                                               │
//!                                               ├─▶ naming (cluster name ⇄ route rule)
//!                                               ├─▶ metadata (backend_name per endpoint)
//!                                               └─▶ upstream_filter (ext_proc injection)
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use aigw_extserver::{storage::route_store_from_config, xds, Config, Result};
//! use aigw_extserver::observability::MetricsRecorder;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_env()?;
//!     let store = route_store_from_config(&config.resolver);
//!     let shutdown = CancellationToken::new();
//!     let hook = xds::hook_service(&config, store, MetricsRecorder::new(), shutdown);
//!     xds::start_extension_server(&config.server, hook, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod storage;
pub mod xds;

// Re-export commonly used types and traits
pub use config::Config;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
