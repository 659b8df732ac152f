//! Cluster naming convention shared with the gateway translator.
//!
//! Clusters generated for an HTTPRoute rule are named
//! `httproute/<namespace>/<routeName>/rule/<ruleIndex>`. Because the AI
//! Gateway renders one HTTPRoute per `AIGatewayRoute` with the same name and
//! rule order, the name is enough to find the backing route rule.

use std::fmt;

const ROUTE_SEGMENT: &str = "httproute";
const RULE_SEGMENT: &str = "rule";
const SEGMENT_COUNT: usize = 5;

/// Route rule a cluster was generated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterIdentity {
    pub namespace: String,
    pub route_name: String,
    pub rule_index: usize,
}

impl ClusterIdentity {
    pub fn new(
        namespace: impl Into<String>,
        route_name: impl Into<String>,
        rule_index: usize,
    ) -> Self {
        Self { namespace: namespace.into(), route_name: route_name.into(), rule_index }
    }

    /// Render the cluster name for this identity.
    pub fn encode(&self) -> String {
        format!(
            "{ROUTE_SEGMENT}/{}/{}/{RULE_SEGMENT}/{}",
            self.namespace, self.route_name, self.rule_index
        )
    }
}

impl fmt::Display for ClusterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Why a cluster name could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The name does not follow the HTTPRoute rule convention at all. Most
    /// clusters in a shared fleet land here.
    #[error("cluster name is not an AI Gateway HTTPRoute rule cluster")]
    NotAnAIGatewayCluster,

    /// The name has the right shape but the rule index is not a
    /// non-negative integer.
    #[error("invalid rule index {raw:?}: {reason}")]
    MalformedRuleIndex { raw: String, reason: String },
}

/// Decode a cluster name into the route rule it belongs to.
pub fn decode(name: &str) -> Result<ClusterIdentity, DecodeError> {
    let parts: Vec<&str> = name.split('/').collect();
    if parts.len() != SEGMENT_COUNT || parts[0] != ROUTE_SEGMENT || parts[3] != RULE_SEGMENT {
        return Err(DecodeError::NotAnAIGatewayCluster);
    }

    let raw_index = parts[4];
    let rule_index = raw_index.parse::<usize>().map_err(|e| DecodeError::MalformedRuleIndex {
        raw: raw_index.to_string(),
        reason: e.to_string(),
    })?;

    Ok(ClusterIdentity::new(parts[1], parts[2], rule_index))
}
