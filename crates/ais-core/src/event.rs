//! Recognized intervention events and the ingress record they arrive in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ConfigurationError;

/// Envelope name under which all fraud-driven interventions arrive; the
/// actual event is identified by the intervention code they carry.
pub const INTERVENTION_EVENT_NAME: &str = "TICF_ACCOUNT_INTERVENTION";

// ─────────────────────────────────────────────────────────────────────────────
// Intervention Event
// ─────────────────────────────────────────────────────────────────────────────

/// Closed set of recognized event identifiers.
///
/// Fraud-driven interventions are applied on behalf of a fraud decision;
/// the `Auth*`/`Ipv*` variants are user-led completions of a required
/// action and never carry an intervention code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterventionEvent {
    FraudSuspendAccount,
    FraudUnsuspendAccount,
    FraudBlockAccount,
    FraudUnblockAccount,
    FraudForcedUserPasswordReset,
    FraudForcedUserIdentityReverification,
    FraudForcedUserPasswordResetAndIdentityReverification,
    IpvAccountInterventionEnd,
    AuthPasswordResetSuccessful,
    AuthPasswordResetSuccessfulForTestClient,
}

impl InterventionEvent {
    /// Get the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FraudSuspendAccount => "FRAUD_SUSPEND_ACCOUNT",
            Self::FraudUnsuspendAccount => "FRAUD_UNSUSPEND_ACCOUNT",
            Self::FraudBlockAccount => "FRAUD_BLOCK_ACCOUNT",
            Self::FraudUnblockAccount => "FRAUD_UNBLOCK_ACCOUNT",
            Self::FraudForcedUserPasswordReset => "FRAUD_FORCED_USER_PASSWORD_RESET",
            Self::FraudForcedUserIdentityReverification => {
                "FRAUD_FORCED_USER_IDENTITY_REVERIFICATION"
            }
            Self::FraudForcedUserPasswordResetAndIdentityReverification => {
                "FRAUD_FORCED_USER_PASSWORD_RESET_AND_IDENTITY_REVERIFICATION"
            }
            Self::IpvAccountInterventionEnd => "IPV_ACCOUNT_INTERVENTION_END",
            Self::AuthPasswordResetSuccessful => "AUTH_PASSWORD_RESET_SUCCESSFUL",
            Self::AuthPasswordResetSuccessfulForTestClient => {
                "AUTH_PASSWORD_RESET_SUCCESSFUL_FOR_TEST_CLIENT"
            }
        }
    }

    /// Check whether this event is a user-led completion rather than a
    /// fraud-driven intervention.
    #[must_use]
    pub const fn is_user_led(&self) -> bool {
        matches!(
            self,
            Self::IpvAccountInterventionEnd
                | Self::AuthPasswordResetSuccessful
                | Self::AuthPasswordResetSuccessfulForTestClient
        )
    }

    /// Map an ingress event name to a user-led completion event.
    ///
    /// Fraud-driven interventions arrive under
    /// [`INTERVENTION_EVENT_NAME`] and are identified by their code
    /// instead; this returns `None` for any other name.
    #[must_use]
    pub fn from_completion_name(name: &str) -> Option<Self> {
        match name {
            "IPV_ACCOUNT_INTERVENTION_END" => Some(Self::IpvAccountInterventionEnd),
            "AUTH_PASSWORD_RESET_SUCCESSFUL" => Some(Self::AuthPasswordResetSuccessful),
            "AUTH_PASSWORD_RESET_SUCCESSFUL_FOR_TEST_CLIENT" => {
                Some(Self::AuthPasswordResetSuccessfulForTestClient)
            }
            _ => None,
        }
    }

    /// Map a numeric intervention code carried by inbound fraud events to
    /// the event it triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownInterventionCode`] when the code
    /// is not part of the deployed configuration.
    pub fn from_intervention_code(code: &str) -> Result<Self, ConfigurationError> {
        match code {
            "01" => Ok(Self::FraudSuspendAccount),
            "02" => Ok(Self::FraudUnsuspendAccount),
            "03" => Ok(Self::FraudBlockAccount),
            "04" => Ok(Self::FraudForcedUserPasswordReset),
            "05" => Ok(Self::FraudForcedUserIdentityReverification),
            "06" => Ok(Self::FraudForcedUserPasswordResetAndIdentityReverification),
            "07" => Ok(Self::FraudUnblockAccount),
            _ => Err(ConfigurationError::UnknownInterventionCode {
                code: code.to_string(),
            }),
        }
    }
}

impl fmt::Display for InterventionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Intervention Code
// ─────────────────────────────────────────────────────────────────────────────

/// Restriction applied by a fraud-driven intervention, persisted on the
/// account record and echoed in audit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterventionCode {
    AisNoIntervention,
    AisAccountSuspended,
    AisAccountUnsuspended,
    AisAccountBlocked,
    AisAccountUnblocked,
    AisForcedUserPasswordReset,
    AisForcedUserIdentityVerify,
    AisForcedUserPasswordResetAndIdentityVerify,
}

impl InterventionCode {
    /// Get the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AisNoIntervention => "AIS_NO_INTERVENTION",
            Self::AisAccountSuspended => "AIS_ACCOUNT_SUSPENDED",
            Self::AisAccountUnsuspended => "AIS_ACCOUNT_UNSUSPENDED",
            Self::AisAccountBlocked => "AIS_ACCOUNT_BLOCKED",
            Self::AisAccountUnblocked => "AIS_ACCOUNT_UNBLOCKED",
            Self::AisForcedUserPasswordReset => "AIS_FORCED_USER_PASSWORD_RESET",
            Self::AisForcedUserIdentityVerify => "AIS_FORCED_USER_IDENTITY_VERIFY",
            Self::AisForcedUserPasswordResetAndIdentityVerify => {
                "AIS_FORCED_USER_PASSWORD_RESET_AND_IDENTITY_VERIFY"
            }
        }
    }
}

impl fmt::Display for InterventionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ingress Event Record
// ─────────────────────────────────────────────────────────────────────────────

/// Incoming event record as delivered by the message queue.
///
/// Carries the event name, a timestamp at second granularity with an
/// optional millisecond refinement, the affected user, and, for
/// fraud-driven events, the fields that populate a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressEvent {
    /// Event name from the closed set of trigger identifiers.
    pub event_name: String,

    /// Identifier of the component that emitted the event.
    pub component_id: String,

    /// Event timestamp in epoch seconds.
    pub timestamp: i64,

    /// Event timestamp in epoch milliseconds, when the producer supplies it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_timestamp_ms: Option<i64>,

    /// The affected user.
    pub user: EventUser,

    /// Intervention details, present on fraud-driven events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<EventExtensions>,
}

impl IngressEvent {
    /// Resolve the event timestamp in milliseconds: the explicit
    /// millisecond timestamp when present, else seconds × 1000.
    #[must_use]
    pub const fn timestamp_ms(&self) -> i64 {
        match self.event_timestamp_ms {
            Some(ms) => ms,
            None => self.timestamp * 1000,
        }
    }
}

/// User identification carried by an ingress event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventUser {
    /// Stable account identifier (storage key).
    pub user_id: String,
}

/// Extension block on fraud-driven events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventExtensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<InterventionDetails>,
}

/// Fraud-decision fields sufficient to populate a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterventionDetails {
    /// Numeric intervention code ("01".."07").
    pub intervention_code: String,

    /// Free-text reason recorded by the fraud decision.
    pub intervention_reason: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub originating_component_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub originator_reference_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<String>,
}
