//! Transition resolution: given an event and the account's current flags,
//! find the one legal next state.

use crate::metrics;
use crate::{
    build_mutation, AccountStateFlags, ConfigurationError, IngressEvent, InterventionCode,
    InterventionEvent, MutationDescriptor, PolicyGraph, TransitionError,
};

/// Outcome of a successful resolution, consumed by the mutation builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTransition {
    /// Flags of the target state.
    pub target: AccountStateFlags,

    /// Intervention code carried by the matched edge; absent on user-led
    /// completion edges.
    pub intervention_code: Option<InterventionCode>,

    /// Node the account was in before the transition.
    pub from_node: String,

    /// Node the account moves to.
    pub to_node: String,
}

/// The state-transition engine: an immutable policy graph and the pure
/// operations over it.
///
/// Holding a `StateEngine` is proof the graph validated; a failed
/// validation prevents construction, so no caller can resolve transitions
/// against a partially valid configuration.
#[derive(Debug, Clone)]
pub struct StateEngine {
    graph: PolicyGraph,
}

impl StateEngine {
    /// Build an engine over an already-validated graph.
    #[must_use]
    pub const fn new(graph: PolicyGraph) -> Self {
        Self { graph }
    }

    /// Build an engine over the production policy graph.
    ///
    /// # Errors
    ///
    /// Propagates graph validation failure.
    pub fn with_production_graph() -> Result<Self, ConfigurationError> {
        Ok(Self::new(PolicyGraph::production()?))
    }

    /// The graph this engine resolves against.
    #[must_use]
    pub const fn graph(&self) -> &PolicyGraph {
        &self.graph
    }

    /// Resolve the transition an event triggers from the current flags.
    ///
    /// `current` absent means no intervention record exists yet and the
    /// graph's default node applies. Pure function of (graph, event,
    /// flags): deterministic and safe to call concurrently.
    ///
    /// # Errors
    ///
    /// - [`TransitionError::StateNotFound`] when the flags match no node
    /// - [`TransitionError::NoTransitions`] when the node has no outgoing
    ///   edges
    /// - [`TransitionError::TransitionNotAllowed`] when no outgoing edge is
    ///   triggered by the event
    /// - [`TransitionError::TargetStateNotFound`] when the matched edge
    ///   points at a node missing from the configuration
    /// - [`TransitionError::TransitionSameAsCurrentState`] when the target
    ///   flags equal the current flags
    /// - [`ConfigurationError::AmbiguousEdge`] (wrapped) when more than one
    ///   outgoing edge matches the event
    pub fn resolve(
        &self,
        event: InterventionEvent,
        current: Option<AccountStateFlags>,
    ) -> Result<ResolvedTransition, TransitionError> {
        match self.resolve_inner(event, current) {
            Ok(resolved) => Ok(resolved),
            Err(error) => {
                tracing::warn!(%event, %error, "transition not resolved");
                metrics::increment(error.metric());
                Err(error)
            }
        }
    }

    fn resolve_inner(
        &self,
        event: InterventionEvent,
        current: Option<AccountStateFlags>,
    ) -> Result<ResolvedTransition, TransitionError> {
        let from_node = match current {
            None => self.graph.default_node(),
            Some(flags) => self
                .graph
                .node_for_flags(flags)
                .ok_or(TransitionError::StateNotFound)?,
        };
        let current_flags = self
            .graph
            .node_flags(from_node)
            .ok_or(TransitionError::StateNotFound)?;

        let adjacency = self.graph.adjacency(from_node).unwrap_or_default();
        if adjacency.is_empty() {
            return Err(TransitionError::NoTransitions {
                node: from_node.to_string(),
            });
        }

        // Scan the whole adjacency list: a second match is a policy
        // authoring bug, not a tie to break.
        let mut matched = None;
        for edge_id in adjacency {
            let edge = self.graph.edge(*edge_id).ok_or_else(|| {
                ConfigurationError::InvalidGraph {
                    reason: format!("node {from_node} references undefined edge {edge_id}"),
                }
            })?;
            if edge.triggering_event == event {
                if matched.is_some() {
                    return Err(ConfigurationError::AmbiguousEdge {
                        node: from_node.to_string(),
                        event,
                    }
                    .into());
                }
                matched = Some(edge);
            }
        }
        let Some(edge) = matched else {
            return Err(TransitionError::TransitionNotAllowed {
                node: from_node.to_string(),
                event,
            });
        };

        // The graph validated against its own `to` pointers at build time;
        // re-check anyway so a broken graph can never yield a transition.
        let target = self
            .graph
            .node_flags(&edge.to)
            .ok_or_else(|| TransitionError::TargetStateNotFound {
                node: edge.to.clone(),
            })?;

        if target == current_flags {
            return Err(TransitionError::TransitionSameAsCurrentState {
                node: from_node.to_string(),
            });
        }

        Ok(ResolvedTransition {
            target,
            intervention_code: edge.intervention_code,
            from_node: from_node.to_string(),
            to_node: edge.to.clone(),
        })
    }

    /// Resolve an event and build the resulting mutation in one step.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures and
    /// [`ConfigurationError::MissingInterventionCode`] from the builder.
    pub fn apply_event_transition(
        &self,
        event: InterventionEvent,
        current: Option<AccountStateFlags>,
        current_timestamp_ms: i64,
        ingress: &IngressEvent,
        previous_applied_at_s: i64,
    ) -> Result<(ResolvedTransition, MutationDescriptor), TransitionError> {
        let resolved = self.resolve(event, current)?;
        let mutation = build_mutation(
            resolved.target,
            event,
            current_timestamp_ms,
            ingress,
            previous_applied_at_s,
            resolved.intervention_code,
        )?;
        Ok((resolved, mutation))
    }
}
