//! Mutation descriptors: the engine's output, handed to the storage
//! collaborator for one atomic conditional write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::metrics::{self, MetricName, ResolutionKind};
use crate::{
    encode_history_entry, AccountStateFlags, ConfigurationError, IngressEvent, InterventionCode,
    InterventionEvent,
};

// ─────────────────────────────────────────────────────────────────────────────
// Field Names
// ─────────────────────────────────────────────────────────────────────────────

/// Persisted record attribute names the descriptor may touch.
pub mod field {
    pub const BLOCKED: &str = "blocked";
    pub const SUSPENDED: &str = "suspended";
    pub const RESET_PASSWORD: &str = "resetPassword";
    pub const REPROVE_IDENTITY: &str = "reproveIdentity";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const INTERVENTION: &str = "intervention";
    pub const APPLIED_AT: &str = "appliedAt";
    pub const SENT_AT: &str = "sentAt";
    pub const RESET_PASSWORD_AT: &str = "resetPasswordAt";
    pub const REPROVED_IDENTITY_AT: &str = "reprovedIdentityAt";
    pub const HISTORY: &str = "history";
}

/// A value assigned to a record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Mutation Descriptor
// ─────────────────────────────────────────────────────────────────────────────

/// Persistence-agnostic description of the next record state.
///
/// Produced once per resolved transition and discarded once handed to the
/// storage collaborator, which applies it as a single atomic, conditionally
/// guarded update.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MutationDescriptor {
    /// Field name → new value.
    pub assignments: BTreeMap<&'static str, FieldValue>,

    /// Fields to remove from the record.
    pub removals: Vec<&'static str>,

    /// Encoded history entry to append to the audit list, creating the
    /// list if absent. At most one per mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_append: Option<String>,
}

impl MutationDescriptor {
    fn assign(&mut self, name: &'static str, value: FieldValue) {
        self.assignments.insert(name, value);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mutation Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Build the mutation for a resolved transition.
///
/// `previous_applied_at_s` is the `appliedAt` of the intervention being
/// resolved, in epoch seconds; it feeds the resolution-time metrics.
///
/// # Errors
///
/// Returns [`ConfigurationError::MissingInterventionCode`] when a
/// fraud-driven event arrives without a code, which is a defect in the
/// deployed policy rather than a runtime input error.
pub fn build_mutation(
    target: AccountStateFlags,
    event: InterventionEvent,
    current_timestamp_ms: i64,
    ingress: &IngressEvent,
    previous_applied_at_s: i64,
    intervention_code: Option<InterventionCode>,
) -> Result<MutationDescriptor, ConfigurationError> {
    let event_timestamp_ms = ingress.timestamp_ms();
    let resolution_seconds = current_timestamp_ms.div_euclid(1000) - previous_applied_at_s;

    let mut mutation = MutationDescriptor::default();
    mutation.assign(field::BLOCKED, FieldValue::Bool(target.blocked));
    mutation.assign(field::SUSPENDED, FieldValue::Bool(target.suspended));
    mutation.assign(field::RESET_PASSWORD, FieldValue::Bool(target.reset_password));
    mutation.assign(
        field::REPROVE_IDENTITY,
        FieldValue::Bool(target.reprove_identity),
    );
    mutation.assign(field::UPDATED_AT, FieldValue::Number(current_timestamp_ms));

    match event {
        InterventionEvent::IpvAccountInterventionEnd => {
            mutation.assign(
                field::REPROVED_IDENTITY_AT,
                FieldValue::Number(event_timestamp_ms),
            );
            metrics::record_time_to_resolve(ResolutionKind::ReproveIdentity, resolution_seconds);
        }
        InterventionEvent::AuthPasswordResetSuccessful
        | InterventionEvent::AuthPasswordResetSuccessfulForTestClient => {
            mutation.assign(
                field::RESET_PASSWORD_AT,
                FieldValue::Number(event_timestamp_ms),
            );
            metrics::record_time_to_resolve(ResolutionKind::PasswordReset, resolution_seconds);
        }
        fraud_event => {
            let Some(code) = intervention_code else {
                tracing::error!(
                    event = %fraud_event,
                    "intervention event arrived without a code in current configuration"
                );
                metrics::increment(MetricName::InterventionDidNotHaveNameInCurrentConfig);
                return Err(ConfigurationError::MissingInterventionCode);
            };

            if fraud_event == InterventionEvent::FraudUnsuspendAccount {
                metrics::record_time_to_resolve(ResolutionKind::Suspension, resolution_seconds);
            }

            mutation.assign(
                field::INTERVENTION,
                FieldValue::Text(code.as_str().to_string()),
            );
            mutation.assign(field::APPLIED_AT, FieldValue::Number(current_timestamp_ms));
            mutation.assign(field::SENT_AT, FieldValue::Number(event_timestamp_ms));
            mutation.history_append = Some(encode_history_entry(ingress, event_timestamp_ms));

            // Drop completion stamps that no longer correspond to a
            // required action in the target state.
            match (target.reset_password, target.reprove_identity) {
                (false, false) => {
                    mutation.removals.push(field::RESET_PASSWORD_AT);
                    mutation.removals.push(field::REPROVED_IDENTITY_AT);
                }
                (true, false) => mutation.removals.push(field::REPROVED_IDENTITY_AT),
                (false, true) => mutation.removals.push(field::RESET_PASSWORD_AT),
                (true, true) => {}
            }
        }
    }

    Ok(mutation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventExtensions, EventUser, InterventionDetails};

    const NOW_MS: i64 = 1_234_567_890;

    fn ingress(event_name: &str) -> IngressEvent {
        IngressEvent {
            event_name: event_name.to_string(),
            component_id: "TICF_CRI".to_string(),
            timestamp: 1_234_567,
            event_timestamp_ms: Some(1_234_567_890),
            user: EventUser {
                user_id: "urn:fdc:test".to_string(),
            },
            extensions: Some(EventExtensions {
                intervention: Some(InterventionDetails {
                    intervention_code: "03".to_string(),
                    intervention_reason: "fraud decision".to_string(),
                    originating_component_id: None,
                    originator_reference_id: None,
                    requester_id: None,
                }),
            }),
        }
    }

    fn flags(blocked: bool, suspended: bool, rp: bool, ri: bool) -> AccountStateFlags {
        AccountStateFlags {
            blocked,
            suspended,
            reset_password: rp,
            reprove_identity: ri,
        }
    }

    #[test]
    fn fraud_intervention_assigns_code_stamps_and_history() {
        let mutation = build_mutation(
            flags(true, false, false, false),
            InterventionEvent::FraudBlockAccount,
            NOW_MS,
            &ingress("TICF_ACCOUNT_INTERVENTION"),
            0,
            Some(InterventionCode::AisAccountBlocked),
        )
        .unwrap();

        assert_eq!(
            mutation.assignments[field::BLOCKED],
            FieldValue::Bool(true)
        );
        assert_eq!(
            mutation.assignments[field::INTERVENTION],
            FieldValue::Text("AIS_ACCOUNT_BLOCKED".to_string())
        );
        assert_eq!(
            mutation.assignments[field::APPLIED_AT],
            FieldValue::Number(NOW_MS)
        );
        assert_eq!(
            mutation.assignments[field::SENT_AT],
            FieldValue::Number(1_234_567_890)
        );
        assert!(mutation.history_append.is_some());
        // Target has no pending user actions, both stamps go.
        assert_eq!(
            mutation.removals,
            vec![field::RESET_PASSWORD_AT, field::REPROVED_IDENTITY_AT]
        );
    }

    #[test]
    fn fraud_intervention_without_code_is_a_configuration_error() {
        let error = build_mutation(
            flags(true, false, false, false),
            InterventionEvent::FraudBlockAccount,
            NOW_MS,
            &ingress("TICF_ACCOUNT_INTERVENTION"),
            0,
            None,
        )
        .unwrap_err();
        assert_eq!(error, ConfigurationError::MissingInterventionCode);
    }

    #[test]
    fn password_reset_success_stamps_completion_and_skips_history() {
        let mutation = build_mutation(
            flags(false, false, false, false),
            InterventionEvent::AuthPasswordResetSuccessful,
            NOW_MS,
            &ingress("AUTH_PASSWORD_RESET_SUCCESSFUL"),
            1_234_000,
            None,
        )
        .unwrap();

        assert_eq!(
            mutation.assignments[field::RESET_PASSWORD_AT],
            FieldValue::Number(1_234_567_890)
        );
        assert!(mutation.history_append.is_none());
        assert!(mutation.removals.is_empty());
        assert!(!mutation.assignments.contains_key(field::INTERVENTION));
    }

    #[test]
    fn identity_reverification_end_stamps_completion_and_skips_history() {
        let mutation = build_mutation(
            flags(false, false, false, false),
            InterventionEvent::IpvAccountInterventionEnd,
            NOW_MS,
            &ingress("IPV_ACCOUNT_INTERVENTION_END"),
            1_234_000,
            None,
        )
        .unwrap();

        assert_eq!(
            mutation.assignments[field::REPROVED_IDENTITY_AT],
            FieldValue::Number(1_234_567_890)
        );
        assert!(mutation.history_append.is_none());
        assert!(mutation.removals.is_empty());
    }

    #[test]
    fn second_granularity_timestamp_is_scaled_to_milliseconds() {
        let mut event = ingress("AUTH_PASSWORD_RESET_SUCCESSFUL");
        event.event_timestamp_ms = None;

        let mutation = build_mutation(
            flags(false, false, false, false),
            InterventionEvent::AuthPasswordResetSuccessful,
            NOW_MS,
            &event,
            0,
            None,
        )
        .unwrap();

        assert_eq!(
            mutation.assignments[field::RESET_PASSWORD_AT],
            FieldValue::Number(1_234_567_000)
        );
    }

    #[test]
    fn stale_stamp_cleanup_tracks_the_target_flags() {
        // Forced password reset: reproveIdentity ends up false, its stamp goes.
        let mutation = build_mutation(
            flags(false, true, true, false),
            InterventionEvent::FraudForcedUserPasswordReset,
            NOW_MS,
            &ingress("TICF_ACCOUNT_INTERVENTION"),
            0,
            Some(InterventionCode::AisForcedUserPasswordReset),
        )
        .unwrap();
        assert_eq!(mutation.removals, vec![field::REPROVED_IDENTITY_AT]);

        // Forced reverification: resetPassword ends up false.
        let mutation = build_mutation(
            flags(false, true, false, true),
            InterventionEvent::FraudForcedUserIdentityReverification,
            NOW_MS,
            &ingress("TICF_ACCOUNT_INTERVENTION"),
            0,
            Some(InterventionCode::AisForcedUserIdentityVerify),
        )
        .unwrap();
        assert_eq!(mutation.removals, vec![field::RESET_PASSWORD_AT]);

        // Both actions required: neither stamp is removed.
        let mutation = build_mutation(
            flags(false, true, true, true),
            InterventionEvent::FraudForcedUserPasswordResetAndIdentityReverification,
            NOW_MS,
            &ingress("TICF_ACCOUNT_INTERVENTION"),
            0,
            Some(InterventionCode::AisForcedUserPasswordResetAndIdentityVerify),
        )
        .unwrap();
        assert!(mutation.removals.is_empty());
    }

    #[test]
    fn resolution_latency_is_recorded_in_seconds_per_branch() {
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};
        use std::collections::BTreeMap;

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        ::metrics::with_local_recorder(&recorder, || {
            build_mutation(
                flags(false, false, false, false),
                InterventionEvent::AuthPasswordResetSuccessful,
                NOW_MS,
                &ingress("AUTH_PASSWORD_RESET_SUCCESSFUL"),
                1_234_000,
                None,
            )
            .unwrap();
            build_mutation(
                flags(false, false, false, false),
                InterventionEvent::IpvAccountInterventionEnd,
                NOW_MS,
                &ingress("IPV_ACCOUNT_INTERVENTION_END"),
                1_233_000,
                None,
            )
            .unwrap();
            build_mutation(
                flags(false, false, false, false),
                InterventionEvent::FraudUnsuspendAccount,
                NOW_MS,
                &ingress("TICF_ACCOUNT_INTERVENTION"),
                1_230_567,
                Some(InterventionCode::AisAccountUnsuspended),
            )
            .unwrap();
        });

        let mut observed = BTreeMap::new();
        for (composite, _unit, _description, value) in snapshotter.snapshot().into_vec() {
            let key = composite.key();
            if key.name() != crate::metrics::TIME_TO_RESOLVE {
                continue;
            }
            let resolution = key
                .labels()
                .find(|label| label.key() == "resolution")
                .map(|label| label.value().to_string())
                .unwrap();
            let DebugValue::Histogram(values) = value else {
                panic!("{} is not a histogram", key.name());
            };
            let seconds: Vec<f64> = values.iter().map(|v| v.into_inner()).collect();
            observed.insert(resolution, seconds);
        }

        // floor(NOW_MS / 1000) minus the previous appliedAt seconds.
        assert_eq!(observed["password_reset"], vec![567.0]);
        assert_eq!(observed["reprove_identity"], vec![1_567.0]);
        assert_eq!(observed["suspension"], vec![4_000.0]);
    }

    #[test]
    fn identical_inputs_produce_identical_mutations() {
        let build = || {
            build_mutation(
                flags(false, true, false, false),
                InterventionEvent::FraudSuspendAccount,
                NOW_MS,
                &ingress("TICF_ACCOUNT_INTERVENTION"),
                0,
                Some(InterventionCode::AisAccountSuspended),
            )
            .unwrap()
        };
        assert_eq!(build(), build());
    }
}
