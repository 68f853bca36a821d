//! The persisted account intervention record and mutation application.

use ais_core::{field, AccountStateFlags, FieldValue, MutationDescriptor};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// One account's persisted restriction record.
///
/// Attribute names mirror the engine's mutation field names; everything the
/// engine can assign or remove has a slot here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    pub blocked: bool,
    pub suspended: bool,
    pub reset_password: bool,
    pub reprove_identity: bool,

    /// Last modification, epoch milliseconds.
    pub updated_at: i64,

    /// Current intervention code, present while an intervention is applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<String>,

    /// When the current intervention was applied, epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<i64>,

    /// When the triggering event was emitted, epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<i64>,

    /// When the user last completed a forced password reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_password_at: Option<i64>,

    /// When the user last completed a forced identity reverification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reproved_identity_at: Option<i64>,

    /// Append-only audit trail of applied interventions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<String>,

    /// Deletion mark; a deleted record never receives further transitions.
    #[serde(default)]
    pub is_account_deleted: bool,

    /// Retention expiry for a deleted record, epoch seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl AccountRecord {
    /// The restriction flag tuple of this record.
    #[must_use]
    pub const fn flags(&self) -> AccountStateFlags {
        AccountStateFlags {
            blocked: self.blocked,
            suspended: self.suspended,
            reset_password: self.reset_password,
            reprove_identity: self.reprove_identity,
        }
    }

    /// Apply a mutation descriptor to this record: assignments, removals,
    /// then the optional history append.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownField`] when the descriptor names a
    /// field the record schema does not know, and a backend error when a
    /// value has the wrong shape for its field.
    pub fn apply(&mut self, mutation: &MutationDescriptor) -> StoreResult<()> {
        for (name, value) in &mutation.assignments {
            match (*name, value) {
                (field::BLOCKED, FieldValue::Bool(v)) => self.blocked = *v,
                (field::SUSPENDED, FieldValue::Bool(v)) => self.suspended = *v,
                (field::RESET_PASSWORD, FieldValue::Bool(v)) => self.reset_password = *v,
                (field::REPROVE_IDENTITY, FieldValue::Bool(v)) => self.reprove_identity = *v,
                (field::UPDATED_AT, FieldValue::Number(v)) => self.updated_at = *v,
                (field::APPLIED_AT, FieldValue::Number(v)) => self.applied_at = Some(*v),
                (field::SENT_AT, FieldValue::Number(v)) => self.sent_at = Some(*v),
                (field::RESET_PASSWORD_AT, FieldValue::Number(v)) => {
                    self.reset_password_at = Some(*v);
                }
                (field::REPROVED_IDENTITY_AT, FieldValue::Number(v)) => {
                    self.reproved_identity_at = Some(*v);
                }
                (field::INTERVENTION, FieldValue::Text(v)) => {
                    self.intervention = Some(v.clone());
                }
                (
                    field::BLOCKED
                    | field::SUSPENDED
                    | field::RESET_PASSWORD
                    | field::REPROVE_IDENTITY
                    | field::UPDATED_AT
                    | field::APPLIED_AT
                    | field::SENT_AT
                    | field::RESET_PASSWORD_AT
                    | field::REPROVED_IDENTITY_AT
                    | field::INTERVENTION,
                    other,
                ) => {
                    return Err(StoreError::Backend(format!(
                        "field {name} assigned incompatible value {other:?}"
                    )));
                }
                (unknown, _) => {
                    return Err(StoreError::UnknownField {
                        name: unknown.to_string(),
                    });
                }
            }
        }

        for name in &mutation.removals {
            match *name {
                field::RESET_PASSWORD_AT => self.reset_password_at = None,
                field::REPROVED_IDENTITY_AT => self.reproved_identity_at = None,
                field::INTERVENTION => self.intervention = None,
                field::APPLIED_AT => self.applied_at = None,
                field::SENT_AT => self.sent_at = None,
                unknown => {
                    return Err(StoreError::UnknownField {
                        name: unknown.to_string(),
                    });
                }
            }
        }

        if let Some(entry) = &mutation.history_append {
            self.history.push(entry.clone());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ais_core::{
        build_mutation, EventUser, IngressEvent, InterventionCode, InterventionEvent,
    };

    fn completion_event() -> IngressEvent {
        IngressEvent {
            event_name: "AUTH_PASSWORD_RESET_SUCCESSFUL".to_string(),
            component_id: "UserManagement".to_string(),
            timestamp: 1_234_567,
            event_timestamp_ms: None,
            user: EventUser {
                user_id: "urn:fdc:test".to_string(),
            },
            extensions: None,
        }
    }

    #[test]
    fn apply_assigns_flags_and_stamps() {
        let target = AccountStateFlags {
            blocked: false,
            suspended: false,
            reset_password: false,
            reprove_identity: false,
        };
        let mutation = build_mutation(
            target,
            InterventionEvent::AuthPasswordResetSuccessful,
            1_234_567_890,
            &completion_event(),
            0,
            None,
        )
        .unwrap();

        let mut record = AccountRecord {
            suspended: true,
            reset_password: true,
            ..AccountRecord::default()
        };
        record.apply(&mutation).unwrap();

        assert!(!record.suspended);
        assert!(!record.reset_password);
        assert_eq!(record.updated_at, 1_234_567_890);
        assert_eq!(record.reset_password_at, Some(1_234_567_000));
        assert!(record.history.is_empty());
    }

    #[test]
    fn apply_runs_removals_and_appends_history() {
        let target = AccountStateFlags {
            blocked: true,
            suspended: false,
            reset_password: false,
            reprove_identity: false,
        };
        let mut event = completion_event();
        event.event_name = "TICF_ACCOUNT_INTERVENTION".to_string();
        let mutation = build_mutation(
            target,
            InterventionEvent::FraudBlockAccount,
            1_234_567_890,
            &event,
            0,
            Some(InterventionCode::AisAccountBlocked),
        )
        .unwrap();

        let mut record = AccountRecord {
            suspended: true,
            reset_password: true,
            reset_password_at: Some(1_000),
            reproved_identity_at: Some(2_000),
            ..AccountRecord::default()
        };
        record.apply(&mutation).unwrap();

        assert!(record.blocked);
        assert_eq!(record.intervention, Some("AIS_ACCOUNT_BLOCKED".to_string()));
        assert_eq!(record.reset_password_at, None);
        assert_eq!(record.reproved_identity_at, None);
        assert_eq!(record.history.len(), 1);

        // A second application appends again, never rewrites.
        record.apply(&mutation).unwrap();
        assert_eq!(record.history.len(), 2);
    }
}
