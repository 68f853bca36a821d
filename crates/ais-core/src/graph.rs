//! The policy graph: legal account states and the events that move between
//! them.
//!
//! A graph is plain data plus a one-time validation pass. Once validated it
//! is immutable for the life of the process; tests substitute whole
//! alternate graphs rather than patching one in place.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::metrics::{self, MetricName};
use crate::{AccountStateFlags, ConfigurationError, InterventionCode, InterventionEvent};

/// Edge identifier within one graph.
pub type EdgeId = u32;

/// A configured legal transition, keyed by triggering event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEdge {
    /// Target node name.
    pub to: String,

    /// Event that moves an account along this edge.
    pub triggering_event: InterventionEvent,

    /// Present only for fraud-driven interventions; user-led completion
    /// edges carry none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention_code: Option<InterventionCode>,
}

/// Raw graph description prior to validation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyGraphConfig {
    /// Node used when an account has no intervention record yet.
    pub default_node: String,

    /// Node name → the flag tuple it corresponds to.
    pub nodes: BTreeMap<String, AccountStateFlags>,

    /// Node name → ordered edge ids outgoing from that node.
    pub adjacency: BTreeMap<String, Vec<EdgeId>>,

    /// Edge id → edge.
    pub edges: BTreeMap<EdgeId, TransitionEdge>,
}

/// A validated, immutable policy graph.
///
/// Construction is the only place validation runs; holding a `PolicyGraph`
/// is proof the invariants held. There is no mutable access.
#[derive(Debug, Clone)]
pub struct PolicyGraph {
    config: PolicyGraphConfig,
    flags_to_node: HashMap<AccountStateFlags, String>,
}

impl PolicyGraph {
    /// Validate a raw configuration and build the graph.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidGraph`] if any node lacks an
    /// adjacency entry, any adjacency entry names an unknown node or edge,
    /// any edge targets an undefined node, the default node is undefined,
    /// or two nodes share a flag tuple.
    pub fn new(config: PolicyGraphConfig) -> Result<Self, ConfigurationError> {
        match Self::validate(&config) {
            Ok(flags_to_node) => Ok(Self {
                config,
                flags_to_node,
            }),
            Err(error) => {
                tracing::error!(%error, "policy graph failed validation");
                metrics::increment(MetricName::InvalidStateEngineConfiguration);
                Err(error)
            }
        }
    }

    fn validate(
        config: &PolicyGraphConfig,
    ) -> Result<HashMap<AccountStateFlags, String>, ConfigurationError> {
        let invalid = |reason: String| ConfigurationError::InvalidGraph { reason };

        if !config.nodes.contains_key(&config.default_node) {
            return Err(invalid(format!(
                "default node {} is not defined",
                config.default_node
            )));
        }

        for node in config.nodes.keys() {
            if !config.adjacency.contains_key(node) {
                return Err(invalid(format!("node {node} has no adjacency entry")));
            }
        }

        for (node, edge_ids) in &config.adjacency {
            if !config.nodes.contains_key(node) {
                return Err(invalid(format!(
                    "adjacency entry for undefined node {node}"
                )));
            }
            for edge_id in edge_ids {
                if !config.edges.contains_key(edge_id) {
                    return Err(invalid(format!(
                        "node {node} references undefined edge {edge_id}"
                    )));
                }
            }
        }

        for (edge_id, edge) in &config.edges {
            if !config.nodes.contains_key(&edge.to) {
                return Err(invalid(format!(
                    "edge {edge_id} targets undefined node {}",
                    edge.to
                )));
            }
        }

        // Flag-tuple to node-name mapping must be a bijection.
        let mut flags_to_node = HashMap::with_capacity(config.nodes.len());
        for (node, flags) in &config.nodes {
            if let Some(existing) = flags_to_node.insert(*flags, node.clone()) {
                return Err(invalid(format!(
                    "nodes {existing} and {node} share the same flag tuple"
                )));
            }
        }

        Ok(flags_to_node)
    }

    /// Name of the designated "no intervention" node.
    #[must_use]
    pub fn default_node(&self) -> &str {
        &self.config.default_node
    }

    /// Look up a node's flag tuple.
    #[must_use]
    pub fn node_flags(&self, node: &str) -> Option<AccountStateFlags> {
        self.config.nodes.get(node).copied()
    }

    /// Find the unique node matching a flag tuple, if any.
    #[must_use]
    pub fn node_for_flags(&self, flags: AccountStateFlags) -> Option<&str> {
        self.flags_to_node.get(&flags).map(String::as_str)
    }

    /// Ordered edge ids outgoing from a node.
    #[must_use]
    pub fn adjacency(&self, node: &str) -> Option<&[EdgeId]> {
        self.config.adjacency.get(node).map(Vec::as_slice)
    }

    /// Look up an edge by id.
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&TransitionEdge> {
        self.config.edges.get(&id)
    }

    /// The production policy graph for the intervention service.
    ///
    /// # Errors
    ///
    /// Propagates validation failure; the shipped table always passes.
    pub fn production() -> Result<Self, ConfigurationError> {
        Self::new(production_config())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Production Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Node names used by the production graph.
pub mod node {
    pub const NO_INTERVENTION: &str = "NoIntervention";
    pub const SUSPENDED: &str = "Suspended";
    pub const BLOCKED: &str = "Blocked";
    pub const SUSPENDED_RESET_PASSWORD: &str = "SuspendedResetPassword";
    pub const SUSPENDED_REPROVE_ID: &str = "SuspendedReproveId";
    pub const SUSPENDED_RESET_PASSWORD_REPROVE_ID: &str = "SuspendedResetPasswordReproveId";
}

/// Raw production configuration: six states, shared edges.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn production_config() -> PolicyGraphConfig {
    use InterventionCode as Code;
    use InterventionEvent as Event;

    let flags = |blocked, suspended, reset_password, reprove_identity| AccountStateFlags {
        blocked,
        suspended,
        reset_password,
        reprove_identity,
    };

    let nodes = BTreeMap::from([
        (node::NO_INTERVENTION.to_string(), flags(false, false, false, false)),
        (node::SUSPENDED.to_string(), flags(false, true, false, false)),
        (node::BLOCKED.to_string(), flags(true, false, false, false)),
        (
            node::SUSPENDED_RESET_PASSWORD.to_string(),
            flags(false, true, true, false),
        ),
        (
            node::SUSPENDED_REPROVE_ID.to_string(),
            flags(false, true, false, true),
        ),
        (
            node::SUSPENDED_RESET_PASSWORD_REPROVE_ID.to_string(),
            flags(false, true, true, true),
        ),
    ]);

    let edge = |to: &str, triggering_event, intervention_code| TransitionEdge {
        to: to.to_string(),
        triggering_event,
        intervention_code,
    };

    let edges = BTreeMap::from([
        (
            1,
            edge(
                node::SUSPENDED,
                Event::FraudSuspendAccount,
                Some(Code::AisAccountSuspended),
            ),
        ),
        (
            2,
            edge(
                node::NO_INTERVENTION,
                Event::FraudUnsuspendAccount,
                Some(Code::AisAccountUnsuspended),
            ),
        ),
        (
            3,
            edge(
                node::BLOCKED,
                Event::FraudBlockAccount,
                Some(Code::AisAccountBlocked),
            ),
        ),
        (
            4,
            edge(
                node::NO_INTERVENTION,
                Event::FraudUnblockAccount,
                Some(Code::AisAccountUnblocked),
            ),
        ),
        (
            5,
            edge(
                node::SUSPENDED_RESET_PASSWORD,
                Event::FraudForcedUserPasswordReset,
                Some(Code::AisForcedUserPasswordReset),
            ),
        ),
        (
            6,
            edge(
                node::SUSPENDED_REPROVE_ID,
                Event::FraudForcedUserIdentityReverification,
                Some(Code::AisForcedUserIdentityVerify),
            ),
        ),
        (
            7,
            edge(
                node::SUSPENDED_RESET_PASSWORD_REPROVE_ID,
                Event::FraudForcedUserPasswordResetAndIdentityReverification,
                Some(Code::AisForcedUserPasswordResetAndIdentityVerify),
            ),
        ),
        (
            8,
            edge(node::NO_INTERVENTION, Event::AuthPasswordResetSuccessful, None),
        ),
        (
            9,
            edge(
                node::NO_INTERVENTION,
                Event::AuthPasswordResetSuccessfulForTestClient,
                None,
            ),
        ),
        (
            10,
            edge(node::NO_INTERVENTION, Event::IpvAccountInterventionEnd, None),
        ),
        (
            11,
            edge(
                node::SUSPENDED_REPROVE_ID,
                Event::AuthPasswordResetSuccessful,
                None,
            ),
        ),
        (
            12,
            edge(
                node::SUSPENDED_REPROVE_ID,
                Event::AuthPasswordResetSuccessfulForTestClient,
                None,
            ),
        ),
        (
            13,
            edge(
                node::SUSPENDED_RESET_PASSWORD,
                Event::IpvAccountInterventionEnd,
                None,
            ),
        ),
    ]);

    let adjacency = BTreeMap::from([
        (node::NO_INTERVENTION.to_string(), vec![1, 3, 5, 6, 7]),
        (node::SUSPENDED.to_string(), vec![2, 3, 5, 6, 7]),
        (node::BLOCKED.to_string(), vec![4]),
        (
            node::SUSPENDED_RESET_PASSWORD.to_string(),
            vec![1, 2, 3, 6, 7, 8, 9],
        ),
        (
            node::SUSPENDED_REPROVE_ID.to_string(),
            vec![1, 2, 3, 5, 7, 10],
        ),
        (
            node::SUSPENDED_RESET_PASSWORD_REPROVE_ID.to_string(),
            vec![1, 2, 3, 5, 6, 11, 12, 13],
        ),
    ]);

    PolicyGraphConfig {
        default_node: node::NO_INTERVENTION.to_string(),
        nodes,
        adjacency,
        edges,
    }
}
