//! Account restriction state: the four-flag tuple and its derived,
//! externally visible status.

use serde::{Deserialize, Serialize};
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Account State Flags
// ─────────────────────────────────────────────────────────────────────────────

/// The account's current restriction posture.
///
/// A value type: transitions always produce a new tuple, never mutate one in
/// place. Field names match the persisted record attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStateFlags {
    /// Account is permanently blocked.
    pub blocked: bool,

    /// Account is suspended.
    pub suspended: bool,

    /// User must complete a password reset to lift the suspension.
    pub reset_password: bool,

    /// User must re-verify their identity to lift the suspension.
    pub reprove_identity: bool,
}

impl AccountStateFlags {
    /// The unrestricted posture: no intervention applied.
    #[must_use]
    pub const fn no_intervention() -> Self {
        Self {
            blocked: false,
            suspended: false,
            reset_password: false,
            reprove_identity: false,
        }
    }

    /// Check whether any restriction is currently in force.
    #[must_use]
    pub const fn is_restricted(&self) -> bool {
        self.blocked || self.suspended
    }
}

impl fmt::Display for AccountStateFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blocked={} suspended={} resetPassword={} reproveIdentity={}",
            self.blocked, self.suspended, self.reset_password, self.reprove_identity
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Derived Account Status
// ─────────────────────────────────────────────────────────────────────────────

/// User action required to lift an active suspension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    ResetPassword,
    ReproveIdentity,
    ResetPasswordAndReproveIdentity,
}

impl UserAction {
    /// Get the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ResetPassword => "reset_password",
            Self::ReproveIdentity => "reprove_identity",
            Self::ResetPasswordAndReproveIdentity => "reset_password_and_reprove_identity",
        }
    }
}

/// Externally visible account status, derived from the stored flags.
///
/// Precedence: deleted over blocked over suspended over active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Suspended {
        #[serde(skip_serializing_if = "Option::is_none")]
        action: Option<UserAction>,
    },
    PermanentlySuspended,
    Deleted,
}

impl AccountStatus {
    /// Derive the status a caller sees from the persisted flags.
    #[must_use]
    pub const fn derive(flags: AccountStateFlags, is_deleted: bool) -> Self {
        if is_deleted {
            return Self::Deleted;
        }
        if flags.blocked {
            return Self::PermanentlySuspended;
        }
        if flags.suspended {
            let action = match (flags.reset_password, flags.reprove_identity) {
                (true, true) => Some(UserAction::ResetPasswordAndReproveIdentity),
                (true, false) => Some(UserAction::ResetPassword),
                (false, true) => Some(UserAction::ReproveIdentity),
                (false, false) => None,
            };
            return Self::Suspended { action };
        }
        Self::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_intervention_is_all_false() {
        let flags = AccountStateFlags::no_intervention();
        assert!(!flags.blocked);
        assert!(!flags.suspended);
        assert!(!flags.reset_password);
        assert!(!flags.reprove_identity);
        assert!(!flags.is_restricted());
    }

    #[test]
    fn flags_serialize_with_record_attribute_names() {
        let flags = AccountStateFlags {
            blocked: false,
            suspended: true,
            reset_password: true,
            reprove_identity: false,
        };
        let json = serde_json::to_value(&flags).unwrap();
        assert_eq!(json["resetPassword"], true);
        assert_eq!(json["reproveIdentity"], false);
    }

    #[test]
    fn status_precedence_deleted_wins() {
        let blocked = AccountStateFlags {
            blocked: true,
            ..AccountStateFlags::no_intervention()
        };
        assert_eq!(AccountStatus::derive(blocked, true), AccountStatus::Deleted);
        assert_eq!(
            AccountStatus::derive(blocked, false),
            AccountStatus::PermanentlySuspended
        );
    }

    #[test]
    fn suspended_status_carries_the_action_hint() {
        let flags = AccountStateFlags {
            suspended: true,
            reset_password: true,
            ..AccountStateFlags::no_intervention()
        };
        assert_eq!(
            AccountStatus::derive(flags, false),
            AccountStatus::Suspended {
                action: Some(UserAction::ResetPassword)
            }
        );

        let plain = AccountStateFlags {
            suspended: true,
            ..AccountStateFlags::no_intervention()
        };
        assert_eq!(
            AccountStatus::derive(plain, false),
            AccountStatus::Suspended { action: None }
        );
    }

    #[test]
    fn active_when_nothing_is_set() {
        assert_eq!(
            AccountStatus::derive(AccountStateFlags::no_intervention(), false),
            AccountStatus::Active
        );
    }
}
