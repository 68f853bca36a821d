//! Error taxonomy for the state-transition engine.
//!
//! Two classes:
//!
//! - [`ConfigurationError`]: a defect in the deployed policy. Fatal to the
//!   engine's usability and never a property of a particular incoming event.
//! - [`TransitionError`]: per-event, recoverable at the caller's discretion.
//!   [`TransitionError::TransitionNotAllowed`] in particular is a
//!   semantically expected outcome which callers normally log and ignore.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::MetricName;
use crate::InterventionEvent;

/// Defects in the deployed policy configuration (fatal, not retryable).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationError {
    /// The policy graph failed its one-time validation.
    #[error("invalid state engine configuration: {reason}")]
    InvalidGraph { reason: String },

    /// A fraud-driven intervention edge carries no intervention code.
    #[error("intervention event is missing its code in current configuration")]
    MissingInterventionCode,

    /// More than one outgoing edge matches the same event from one node.
    #[error("ambiguous configuration: multiple edges for {event} from state {node}")]
    AmbiguousEdge {
        node: String,
        event: InterventionEvent,
    },

    /// A numeric intervention code is not part of the configuration.
    #[error("code {code} is not found in current configuration")]
    UnknownInterventionCode { code: String },
}

impl ConfigurationError {
    /// Diagnostic metric classifying this error.
    #[must_use]
    pub const fn metric(&self) -> MetricName {
        match self {
            Self::InvalidGraph { .. } | Self::AmbiguousEdge { .. } => {
                MetricName::InvalidStateEngineConfiguration
            }
            Self::MissingInterventionCode => {
                MetricName::InterventionDidNotHaveNameInCurrentConfig
            }
            Self::UnknownInterventionCode { .. } => MetricName::InterventionCodeNotFoundInConfig,
        }
    }
}

/// Per-event resolution failures (recoverable at the caller's discretion).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionError {
    /// The account's flag tuple matches no configured node.
    #[error("account state does not exist in current configuration")]
    StateNotFound,

    /// An edge points at a node missing from the configuration.
    #[error("state {node} not found in current configuration")]
    TargetStateNotFound { node: String },

    /// The current node has no outgoing edges.
    #[error("there are no allowed transitions from state {node} in current configuration")]
    NoTransitions { node: String },

    /// The event is not a legal move from the current state.
    #[error("{event} is not allowed from state {node}")]
    TransitionNotAllowed {
        node: String,
        event: InterventionEvent,
    },

    /// The computed new state equals the current state.
    #[error("computed new state is the same as the current state")]
    TransitionSameAsCurrentState { node: String },

    /// The configuration itself is defective. Serializes as the inner
    /// error's own tagged form.
    #[error(transparent)]
    #[serde(untagged)]
    Configuration(#[from] ConfigurationError),
}

impl TransitionError {
    /// Whether a caller may treat this outcome as "ignored" rather than a
    /// fault. Everything else indicates either bad account data or a broken
    /// configuration.
    #[must_use]
    pub const fn is_ignorable(&self) -> bool {
        matches!(self, Self::TransitionNotAllowed { .. })
    }

    /// Diagnostic metric classifying this error.
    #[must_use]
    pub const fn metric(&self) -> MetricName {
        match self {
            Self::StateNotFound | Self::TargetStateNotFound { .. } => {
                MetricName::StateNotFoundInCurrentConfig
            }
            Self::NoTransitions { .. } => MetricName::NoTransitionsFoundInConfig,
            Self::TransitionNotAllowed { .. } => MetricName::StateTransitionNotAllowedOrIgnored,
            Self::TransitionSameAsCurrentState { .. } => MetricName::TransitionSameAsCurrentState,
            Self::Configuration(inner) => inner.metric(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_allowed_is_ignorable() {
        let not_allowed = TransitionError::TransitionNotAllowed {
            node: "Blocked".to_string(),
            event: InterventionEvent::FraudSuspendAccount,
        };
        assert!(not_allowed.is_ignorable());

        assert!(!TransitionError::StateNotFound.is_ignorable());
        assert!(!TransitionError::NoTransitions {
            node: "Blocked".to_string()
        }
        .is_ignorable());
        assert!(!TransitionError::Configuration(ConfigurationError::MissingInterventionCode)
            .is_ignorable());
    }

    #[test]
    fn errors_carry_a_pattern_matchable_kind_tag() {
        let error = TransitionError::TargetStateNotFound {
            node: "AccountIsNotOkay".to_string(),
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["kind"], "target_state_not_found");
        assert_eq!(json["node"], "AccountIsNotOkay");
    }

    #[test]
    fn configuration_errors_propagate_through_the_transition_class() {
        let error: TransitionError = ConfigurationError::AmbiguousEdge {
            node: "Suspended".to_string(),
            event: InterventionEvent::FraudBlockAccount,
        }
        .into();
        assert_eq!(
            error.metric(),
            MetricName::InvalidStateEngineConfiguration
        );
    }
}
