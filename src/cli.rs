//! # Command Line Interface
//!
//! Flags override the `AIGW_*` environment configuration.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "aigw-extserver")]
#[command(about = "Envoy Gateway extension server for the AI Gateway")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Address to bind the gRPC server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the gRPC server to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Manifest file with the AIGatewayRoute objects
    #[arg(short, long, value_name = "FILE")]
    pub routes: Option<PathBuf>,

    /// Log level or filter directives (e.g. "info,aigw_extserver=debug")
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(routes) = &self.routes {
            config.resolver.manifest_path = Some(routes.clone());
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if self.json_logs {
            config.observability.json_logging = true;
        }
    }
}
