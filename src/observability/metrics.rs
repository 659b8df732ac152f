//! # Metrics Collection
//!
//! Prometheus metrics for the extension hooks. Recording goes through the
//! `metrics` facade, so it is a no-op until [`init_metrics`] installs the
//! exporter.

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Result of enriching a single cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnrichmentOutcome {
    Enriched,
    NotAiGateway,
    MalformedRuleIndex,
    RouteNotFound,
    RuleIndexOutOfRange,
    MissingLoadAssignment,
    EndpointCountMismatch,
    Panicked,
}

impl EnrichmentOutcome {
    pub const ALL: [EnrichmentOutcome; 8] = [
        EnrichmentOutcome::Enriched,
        EnrichmentOutcome::NotAiGateway,
        EnrichmentOutcome::MalformedRuleIndex,
        EnrichmentOutcome::RouteNotFound,
        EnrichmentOutcome::RuleIndexOutOfRange,
        EnrichmentOutcome::MissingLoadAssignment,
        EnrichmentOutcome::EndpointCountMismatch,
        EnrichmentOutcome::Panicked,
    ];

    /// Label value used for `aigw_cluster_enrichment_total{outcome}`
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentOutcome::Enriched => "enriched",
            EnrichmentOutcome::NotAiGateway => "not_ai_gateway",
            EnrichmentOutcome::MalformedRuleIndex => "malformed_rule_index",
            EnrichmentOutcome::RouteNotFound => "route_not_found",
            EnrichmentOutcome::RuleIndexOutOfRange => "rule_index_out_of_range",
            EnrichmentOutcome::MissingLoadAssignment => "missing_load_assignment",
            EnrichmentOutcome::EndpointCountMismatch => "endpoint_count_mismatch",
            EnrichmentOutcome::Panicked => "panicked",
        }
    }
}

/// Metrics recorder that tracks extension server metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record an extension hook invocation
    pub fn record_hook_request(&self, method: &str) {
        let labels = [("method", method.to_string())];
        counter!("aigw_extension_requests_total", &labels).increment(1);
    }

    /// Record how long an extension hook took, in seconds
    pub fn record_hook_duration(&self, method: &str, duration: f64) {
        let labels = [("method", method.to_string())];
        histogram!("aigw_extension_request_duration_seconds", &labels).record(duration);
    }

    /// Record the outcome of one cluster enrichment
    pub fn record_enrichment(&self, outcome: EnrichmentOutcome) {
        counter!("aigw_cluster_enrichment_total", "outcome" => outcome.as_str()).increment(1);
    }

    /// Describe metrics and initialize outcome counters to zero
    pub fn register_metrics(&self) {
        describe_counter!(
            "aigw_extension_requests_total",
            Unit::Count,
            "Extension hook invocations by gRPC method"
        );
        describe_histogram!(
            "aigw_extension_request_duration_seconds",
            Unit::Seconds,
            "Duration of extension hook invocations"
        );
        describe_counter!(
            "aigw_cluster_enrichment_total",
            Unit::Count,
            "Clusters processed by the enricher, by outcome"
        );

        for outcome in EnrichmentOutcome::ALL {
            counter!("aigw_cluster_enrichment_total", "outcome" => outcome.as_str()).absolute(0);
        }
    }
}

/// Initialize the Prometheus exporter when metrics are enabled
pub fn init_metrics(config: &ObservabilityConfig) -> Result<Option<MetricsRecorder>> {
    if !config.enable_metrics {
        return Ok(None);
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(None);
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        Error::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| Error::config(format!("Failed to initialize metrics exporter: {}", e)))?;

    let recorder = MetricsRecorder::new();
    recorder.register_metrics();

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(Some(recorder))
}
