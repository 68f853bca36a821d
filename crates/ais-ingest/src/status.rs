//! Status projection: the externally visible view of an account record.

use ais_core::{AccountStatus, HistoryEntry, InterventionCode};
use ais_store::AccountRecord;
use serde::Serialize;

/// Status response for one account, derived from its record.
///
/// An account without a record reports as active with no intervention;
/// consumers never learn whether a record exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusProjection {
    /// Derived status, deletion taking precedence over every restriction.
    pub status: AccountStatus,

    /// Active intervention code, `AIS_NO_INTERVENTION` when none applies.
    pub description: String,

    /// Last record modification, epoch milliseconds.
    pub updated_at: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_password_at: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reproved_identity_at: Option<i64>,

    /// Decoded audit history, oldest first. Tokens that fail to decode are
    /// skipped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
}

impl StatusProjection {
    /// Project a stored record, or the default view when none exists.
    #[must_use]
    pub fn from_record(record: Option<&AccountRecord>) -> Self {
        let Some(record) = record else {
            return Self::default_view();
        };

        let description = record
            .intervention
            .clone()
            .unwrap_or_else(|| InterventionCode::AisNoIntervention.as_str().to_string());

        let history = record
            .history
            .iter()
            .filter_map(|token| match HistoryEntry::decode(token) {
                Ok(entry) => Some(entry),
                Err(error) => {
                    tracing::warn!(%error, "skipping undecodable history entry");
                    None
                }
            })
            .collect();

        Self {
            status: AccountStatus::derive(record.flags(), record.is_account_deleted),
            description,
            updated_at: record.updated_at,
            applied_at: record.applied_at,
            sent_at: record.sent_at,
            reset_password_at: record.reset_password_at,
            reproved_identity_at: record.reproved_identity_at,
            history,
        }
    }

    fn default_view() -> Self {
        Self {
            status: AccountStatus::Active,
            description: InterventionCode::AisNoIntervention.as_str().to_string(),
            updated_at: 0,
            applied_at: None,
            sent_at: None,
            reset_password_at: None,
            reproved_identity_at: None,
            history: Vec::new(),
        }
    }
}
