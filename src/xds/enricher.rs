//! # Cluster Enrichment
//!
//! Annotates the endpoints of AI Gateway clusters with the backend they stand
//! for. Envoy Gateway renders one endpoint per `backendRef` of an HTTPRoute
//! rule, in rule order, so the i-th flattened endpoint of the cluster belongs
//! to the i-th backend reference of the matching `AIGatewayRoute` rule.
//!
//! Enrichment is fail-open: any cluster that cannot be matched is returned
//! exactly as it arrived, and the reason is only visible in logs and metrics.

use crate::config::UpstreamExtProcConfig;
use crate::observability::{EnrichmentOutcome, MetricsRecorder};
use crate::xds::metadata;
use crate::xds::naming::{self, ClusterIdentity, DecodeError};
use crate::xds::resolver::{RouteNotFound, RouteResolver};
use crate::xds::upstream_filter::{self, InjectError};
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Why a cluster was left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
enum SkipReason {
    #[error("non-ai-gateway cluster name")]
    NotAiGateway,

    #[error("failed to parse HTTPRoute rule index")]
    MalformedRuleIndex { raw: String, reason: String },

    #[error("failed to get AIGatewayRoute object")]
    RouteNotFound { identity: ClusterIdentity, source: RouteNotFound },

    #[error("HTTPRoute rule index out of range")]
    RuleIndexOutOfRange { identity: ClusterIdentity, rules: usize },

    #[error("LoadAssignment is nil")]
    MissingLoadAssignment { identity: ClusterIdentity },

    #[error("LoadAssignment endpoints length does not match backend refs length")]
    EndpointCountMismatch { identity: ClusterIdentity, endpoints: usize, backend_refs: usize },
}

impl SkipReason {
    fn outcome(&self) -> EnrichmentOutcome {
        match self {
            SkipReason::NotAiGateway => EnrichmentOutcome::NotAiGateway,
            SkipReason::MalformedRuleIndex { .. } => EnrichmentOutcome::MalformedRuleIndex,
            SkipReason::RouteNotFound { .. } => EnrichmentOutcome::RouteNotFound,
            SkipReason::RuleIndexOutOfRange { .. } => EnrichmentOutcome::RuleIndexOutOfRange,
            SkipReason::MissingLoadAssignment { .. } => EnrichmentOutcome::MissingLoadAssignment,
            SkipReason::EndpointCountMismatch { .. } => EnrichmentOutcome::EndpointCountMismatch,
        }
    }

    fn log(&self, cluster: &str) {
        match self {
            SkipReason::NotAiGateway => info!(cluster = %cluster, "{}", self),
            SkipReason::MalformedRuleIndex { raw, reason } => {
                error!(cluster = %cluster, rule_index = %raw, error = %reason, "{}", self)
            }
            SkipReason::RouteNotFound { identity, source } => error!(
                cluster = %cluster,
                namespace = %identity.namespace,
                route = %identity.route_name,
                rule_index = identity.rule_index,
                error = %source.reason,
                "{}",
                self
            ),
            SkipReason::RuleIndexOutOfRange { identity, rules } => info!(
                cluster = %cluster,
                namespace = %identity.namespace,
                route = %identity.route_name,
                rule_index = identity.rule_index,
                rules = rules,
                "{}",
                self
            ),
            SkipReason::MissingLoadAssignment { identity } => info!(
                cluster = %cluster,
                namespace = %identity.namespace,
                route = %identity.route_name,
                rule_index = identity.rule_index,
                "{}",
                self
            ),
            SkipReason::EndpointCountMismatch { identity, endpoints, backend_refs } => info!(
                cluster = %cluster,
                namespace = %identity.namespace,
                route = %identity.route_name,
                rule_index = identity.rule_index,
                endpoints = endpoints,
                backend_refs = backend_refs,
                "{}",
                self
            ),
        }
    }
}

impl From<DecodeError> for SkipReason {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::NotAnAIGatewayCluster => SkipReason::NotAiGateway,
            DecodeError::MalformedRuleIndex { raw, reason } => {
                SkipReason::MalformedRuleIndex { raw, reason }
            }
        }
    }
}

/// Writes backend metadata into AI Gateway clusters.
#[derive(Debug, Clone)]
pub struct ClusterEnricher {
    resolver: RouteResolver,
    upstream_ext_proc: UpstreamExtProcConfig,
    metrics: MetricsRecorder,
}

impl ClusterEnricher {
    pub fn new(resolver: RouteResolver) -> Self {
        Self {
            resolver,
            upstream_ext_proc: UpstreamExtProcConfig::default(),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn with_upstream_ext_proc(mut self, config: UpstreamExtProcConfig) -> Self {
        self.upstream_ext_proc = config;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Enrich `cluster` in place. Never fails; clusters that do not match
    /// are left unchanged and the reason is logged.
    pub async fn enrich(&self, cluster: &mut Cluster, cancel: &CancellationToken) {
        let identity = match self.try_enrich(cluster, cancel).await {
            Ok(identity) => identity,
            Err(reason) => {
                reason.log(&cluster.name);
                self.metrics.record_enrichment(reason.outcome());
                return;
            }
        };

        self.metrics.record_enrichment(EnrichmentOutcome::Enriched);

        if !self.upstream_ext_proc.enabled {
            return;
        }

        let injected = upstream_filter::ensure_ext_proc_filter(
            cluster,
            &identity.namespace,
            &identity.route_name,
            self.upstream_ext_proc.timeout(),
        );
        if let Err(InjectError::Decode(source)) = injected {
            let cluster = &cluster.name;
            error!(cluster = %cluster, error = %source, "failed to unmarshal HttpProtocolOptions");
        }
    }

    async fn try_enrich(
        &self,
        cluster: &mut Cluster,
        cancel: &CancellationToken,
    ) -> Result<ClusterIdentity, SkipReason> {
        let identity = naming::decode(&cluster.name)?;

        let route = self
            .resolver
            .resolve(&identity.namespace, &identity.route_name, cancel)
            .await
            .map_err(|source| SkipReason::RouteNotFound { identity: identity.clone(), source })?;

        let rule = route.rule(identity.rule_index).ok_or_else(|| SkipReason::RuleIndexOutOfRange {
            identity: identity.clone(),
            rules: route.rules().len(),
        })?;

        let load_assignment = cluster
            .load_assignment
            .as_mut()
            .ok_or_else(|| SkipReason::MissingLoadAssignment { identity: identity.clone() })?;

        let endpoints: usize =
            load_assignment.endpoints.iter().map(|locality| locality.lb_endpoints.len()).sum();
        if endpoints != rule.backend_refs.len() {
            return Err(SkipReason::EndpointCountMismatch {
                identity: identity.clone(),
                endpoints,
                backend_refs: rule.backend_refs.len(),
            });
        }

        let flattened = load_assignment
            .endpoints
            .iter_mut()
            .flat_map(|locality| locality.lb_endpoints.iter_mut());
        for (endpoint, backend_ref) in flattened.zip(&rule.backend_refs) {
            let value = metadata::backend_name_value(&backend_ref.name, &identity.namespace);
            metadata::apply(endpoint, &value);
        }

        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AIGatewayRoute;
    use crate::storage::InMemoryRouteStore;
    use crate::xds::upstream_filter::{
        EXT_PROC_FILTER_NAME, HTTP_PROTOCOL_OPTIONS_KEY, UPSTREAM_CODEC_FILTER_NAME,
    };
    use envoy_types::pb::envoy::config::endpoint::v3::{
        ClusterLoadAssignment, LbEndpoint, LocalityLbEndpoints,
    };
    use envoy_types::pb::envoy::extensions::upstreams::http::v3::HttpProtocolOptions;
    use envoy_types::pb::google::protobuf::Any;
    use prost::Message;
    use proptest::prelude::*;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn enricher_with(routes: Vec<AIGatewayRoute>) -> ClusterEnricher {
        let store = Arc::new(InMemoryRouteStore::with_routes(routes));
        ClusterEnricher::new(RouteResolver::new(store))
    }

    fn myroute_enricher() -> ClusterEnricher {
        enricher_with(vec![AIGatewayRoute::new("ns", "myroute", [vec!["aaa"]])])
    }

    /// Cluster with one locality per entry of `localities`, each holding
    /// that many endpoints.
    fn cluster_with(name: &str, localities: &[usize]) -> Cluster {
        Cluster {
            name: name.to_string(),
            load_assignment: Some(ClusterLoadAssignment {
                cluster_name: name.to_string(),
                endpoints: localities
                    .iter()
                    .map(|&count| LocalityLbEndpoints {
                        lb_endpoints: vec![LbEndpoint::default(); count],
                        ..Default::default()
                    })
                    .collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn backend_names(cluster: &Cluster) -> Vec<Option<String>> {
        cluster
            .load_assignment
            .iter()
            .flat_map(|la| la.endpoints.iter())
            .flat_map(|locality| locality.lb_endpoints.iter())
            .map(|endpoint| metadata::backend_name(endpoint).map(str::to_string))
            .collect()
    }

    fn upstream_filters(cluster: &Cluster) -> Vec<String> {
        cluster
            .typed_extension_protocol_options
            .get(HTTP_PROTOCOL_OPTIONS_KEY)
            .map(|any| HttpProtocolOptions::decode(any.value.as_slice()).unwrap())
            .map(|options| options.http_filters.into_iter().map(|f| f.name).collect())
            .unwrap_or_default()
    }

    async fn assert_unchanged(enricher: &ClusterEnricher, cluster: Cluster) {
        let mut enriched = cluster.clone();
        enricher.enrich(&mut enriched, &CancellationToken::new()).await;
        assert_eq!(enriched, cluster);
    }

    #[tokio::test]
    #[traced_test]
    async fn non_ai_gateway_cluster_is_skipped() {
        let enricher = myroute_enricher();
        for name in ["", "some-cluster", "httproute/ns/myroute/rules/0", "a/b/c/d/e"] {
            assert_unchanged(&enricher, cluster_with(name, &[1])).await;
        }
        assert!(logs_contain("non-ai-gateway cluster name"));
    }

    #[tokio::test]
    #[traced_test]
    async fn malformed_rule_index_is_skipped() {
        assert_unchanged(&myroute_enricher(), cluster_with("httproute/ns/name/rule/invalid", &[1]))
            .await;
        assert!(logs_contain("failed to parse HTTPRoute rule index"));
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_route_is_skipped() {
        assert_unchanged(
            &myroute_enricher(),
            cluster_with("httproute/ns/nonexistent/rule/0", &[1]),
        )
        .await;
        assert!(logs_contain("failed to get AIGatewayRoute object"));
    }

    #[tokio::test]
    #[traced_test]
    async fn cancelled_lookup_is_skipped() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let cluster = cluster_with("httproute/ns/myroute/rule/0", &[1]);
        let mut enriched = cluster.clone();

        myroute_enricher().enrich(&mut enriched, &cancel).await;

        assert_eq!(enriched, cluster);
        assert!(logs_contain("failed to get AIGatewayRoute object"));
        assert!(logs_contain("lookup cancelled"));
    }

    #[tokio::test]
    #[traced_test]
    async fn rule_index_out_of_range_is_skipped() {
        assert_unchanged(&myroute_enricher(), cluster_with("httproute/ns/myroute/rule/99999", &[1]))
            .await;
        assert!(logs_contain("HTTPRoute rule index out of range"));
    }

    #[tokio::test]
    #[traced_test]
    async fn missing_load_assignment_is_skipped() {
        let cluster =
            Cluster { name: "httproute/ns/myroute/rule/0".to_string(), ..Default::default() };
        assert_unchanged(&myroute_enricher(), cluster).await;
        assert!(logs_contain("LoadAssignment is nil"));
    }

    #[tokio::test]
    #[traced_test]
    async fn endpoint_count_mismatch_is_skipped() {
        let enricher = myroute_enricher();
        assert_unchanged(&enricher, cluster_with("httproute/ns/myroute/rule/0", &[])).await;
        assert!(logs_contain(
            "LoadAssignment endpoints length does not match backend refs length"
        ));

        assert_unchanged(&enricher, cluster_with("httproute/ns/myroute/rule/0", &[1, 1])).await;
    }

    #[tokio::test]
    #[traced_test]
    async fn skip_reasons_log_at_their_levels() {
        let enricher = myroute_enricher();
        let cancel = CancellationToken::new();
        let mut clusters = vec![
            cluster_with("some-cluster", &[1]),
            cluster_with("httproute/ns/name/rule/invalid", &[1]),
            cluster_with("httproute/ns/nonexistent/rule/7", &[1]),
            cluster_with("httproute/ns/myroute/rule/99999", &[1]),
            Cluster { name: "httproute/ns/myroute/rule/0".to_string(), ..Default::default() },
            cluster_with("httproute/ns/myroute/rule/0", &[2]),
        ];
        for cluster in &mut clusters {
            enricher.enrich(cluster, &cancel).await;
        }

        let expected = [
            ("non-ai-gateway cluster name", "INFO"),
            ("failed to parse HTTPRoute rule index", "ERROR"),
            ("failed to get AIGatewayRoute object", "ERROR"),
            ("HTTPRoute rule index out of range", "INFO"),
            ("LoadAssignment is nil", "INFO"),
            ("LoadAssignment endpoints length does not match backend refs length", "INFO"),
        ];
        logs_assert(|lines: &[&str]| {
            for (message, level) in expected {
                let line = lines
                    .iter()
                    .find(|line| line.contains(message))
                    .ok_or_else(|| format!("missing log {message:?}"))?;
                if !line.contains(level) {
                    return Err(format!("{message:?} not logged at {level}: {line}"));
                }
            }
            Ok(())
        });
        assert!(logs_contain("rule_index=7"));
    }

    #[tokio::test]
    #[traced_test]
    async fn enriches_matching_cluster_silently() {
        let mut cluster = cluster_with("httproute/ns/myroute/rule/0", &[1]);

        myroute_enricher().enrich(&mut cluster, &CancellationToken::new()).await;

        logs_assert(|lines: &[&str]| {
            if lines.is_empty() {
                Ok(())
            } else {
                Err(format!("expected no log output, got {:?}", lines))
            }
        });

        let endpoint = &cluster.load_assignment.as_ref().unwrap().endpoints[0].lb_endpoints[0];
        let filter_metadata = &endpoint.metadata.as_ref().unwrap().filter_metadata;
        assert_eq!(filter_metadata.len(), 1);
        let fields = &filter_metadata["aigateawy.envoy.io"].fields;
        assert_eq!(fields.len(), 1);
        assert_eq!(metadata::backend_name(endpoint), Some("aaa.ns"));
    }

    #[tokio::test]
    async fn enriched_cluster_gets_upstream_ext_proc() {
        let mut cluster = cluster_with("httproute/ns/myroute/rule/0", &[1]);
        myroute_enricher().enrich(&mut cluster, &CancellationToken::new()).await;

        assert_eq!(
            upstream_filters(&cluster),
            vec![EXT_PROC_FILTER_NAME, UPSTREAM_CODEC_FILTER_NAME]
        );
    }

    #[tokio::test]
    async fn disabled_ext_proc_leaves_protocol_options_alone() {
        let enricher =
            myroute_enricher().with_upstream_ext_proc(UpstreamExtProcConfig::disabled());
        let mut cluster = cluster_with("httproute/ns/myroute/rule/0", &[1]);

        enricher.enrich(&mut cluster, &CancellationToken::new()).await;

        assert_eq!(backend_names(&cluster), vec![Some("aaa.ns".to_string())]);
        assert!(cluster.typed_extension_protocol_options.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn undecodable_protocol_options_keep_metadata() {
        let mut cluster = cluster_with("httproute/ns/myroute/rule/0", &[1]);
        let garbage = Any {
            type_url: "type.googleapis.com/envoy.extensions.upstreams.http.v3.HttpProtocolOptions"
                .to_string(),
            value: b"invalid-protobuf-data".to_vec(),
        };
        cluster
            .typed_extension_protocol_options
            .insert(HTTP_PROTOCOL_OPTIONS_KEY.to_string(), garbage.clone());

        myroute_enricher().enrich(&mut cluster, &CancellationToken::new()).await;

        logs_assert(|lines: &[&str]| {
            let logged = lines.iter().copied().find(|line| line.contains("HttpProtocolOptions"));
            let repeated = |line: &str| line.matches("failed to unmarshal").count() > 1;
            match logged {
                Some(line) if line.contains("ERROR") && !repeated(line) => Ok(()),
                Some(line) => Err(format!("unexpected decode failure log: {line}")),
                None => Err("decode failure was not logged".to_string()),
            }
        });
        assert_eq!(backend_names(&cluster), vec![Some("aaa.ns".to_string())]);
        assert_eq!(cluster.typed_extension_protocol_options[HTTP_PROTOCOL_OPTIONS_KEY], garbage);
    }

    #[tokio::test]
    async fn enrichment_is_idempotent() {
        let enricher = myroute_enricher();
        let cancel = CancellationToken::new();
        let mut cluster = cluster_with("httproute/ns/myroute/rule/0", &[1]);

        enricher.enrich(&mut cluster, &cancel).await;
        let once = cluster.clone();
        enricher.enrich(&mut cluster, &cancel).await;

        assert_eq!(cluster, once);
        assert_eq!(upstream_filters(&cluster).len(), 2);
    }

    #[tokio::test]
    async fn endpoints_follow_backend_order_across_localities() {
        let enricher = enricher_with(vec![AIGatewayRoute::new(
            "ns",
            "multi",
            [vec!["unused"], vec!["a", "b", "c"]],
        )]);
        let mut cluster = cluster_with("httproute/ns/multi/rule/1", &[1, 0, 2]);

        enricher.enrich(&mut cluster, &CancellationToken::new()).await;

        assert_eq!(
            backend_names(&cluster),
            vec![Some("a.ns".to_string()), Some("b.ns".to_string()), Some("c.ns".to_string())]
        );
    }

    #[tokio::test]
    async fn unrelated_endpoint_metadata_survives() {
        let mut cluster = cluster_with("httproute/ns/myroute/rule/0", &[1]);
        let endpoint =
            &mut cluster.load_assignment.as_mut().unwrap().endpoints[0].lb_endpoints[0];
        metadata::apply(endpoint, "stale.ns");
        let existing = endpoint.metadata.as_mut().unwrap();
        existing.filter_metadata.insert("envoy.lb".to_string(), Default::default());

        myroute_enricher().enrich(&mut cluster, &CancellationToken::new()).await;

        let endpoint = &cluster.load_assignment.as_ref().unwrap().endpoints[0].lb_endpoints[0];
        assert!(endpoint.metadata.as_ref().unwrap().filter_metadata.contains_key("envoy.lb"));
        assert_eq!(metadata::backend_name(endpoint), Some("aaa.ns"));
    }

    proptest! {
        #[test]
        fn positional_correspondence_holds_for_any_locality_split(
            localities in prop::collection::vec(0usize..4, 1..6),
        ) {
            let total: usize = localities.iter().sum();
            let backends: Vec<String> = (0..total).map(|i| format!("b{i}")).collect();
            let enricher =
                enricher_with(vec![AIGatewayRoute::new("ns", "r", [backends.clone()])]);
            let mut cluster = cluster_with("httproute/ns/r/rule/0", &localities);

            let runtime =
                tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(enricher.enrich(&mut cluster, &CancellationToken::new()));

            let expected: Vec<Option<String>> =
                backends.iter().map(|b| Some(format!("{b}.ns"))).collect();
            prop_assert_eq!(backend_names(&cluster), expected);
        }
    }
}
