//! Audit-trail history entries: one fixed-shape record per applied
//! fraud-driven intervention.
//!
//! Entries are serialized to a single delimited token and appended to the
//! account's audit list; the list is append-only and entries are never
//! rewritten.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{self, MetricName};
use crate::IngressEvent;

/// Delimiter between history fields. None of the identifier or reason
/// fields may contain it.
pub const HISTORY_DELIMITER: char = '|';

/// Number of fields in an encoded history entry.
pub const HISTORY_FIELD_COUNT: usize = 7;

/// A decoded entry did not contain exactly [`HISTORY_FIELD_COUNT`] fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("history string has {found} fields, expected {HISTORY_FIELD_COUNT}")]
pub struct InvalidHistoryFormat {
    pub found: usize,
}

/// One audit-trail record, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the triggering event occurred, epoch milliseconds.
    pub event_timestamp_ms: String,

    /// Component that emitted the triggering event.
    pub component_id: String,

    /// Numeric intervention code from the fraud decision.
    pub intervention_code: String,

    /// Free-text reason from the fraud decision.
    pub intervention_reason: String,

    pub originating_component_id: String,
    pub originator_reference_id: String,
    pub requester_id: String,
}

impl HistoryEntry {
    /// Serialize to the persisted token form.
    #[must_use]
    pub fn encode(&self) -> String {
        [
            self.event_timestamp_ms.as_str(),
            self.component_id.as_str(),
            self.intervention_code.as_str(),
            self.intervention_reason.as_str(),
            self.originating_component_id.as_str(),
            self.originator_reference_id.as_str(),
            self.requester_id.as_str(),
        ]
        .join(&HISTORY_DELIMITER.to_string())
    }

    /// Decode a persisted token back into its fields, for audit inspection.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHistoryFormat`] when the token does not contain
    /// exactly [`HISTORY_FIELD_COUNT`] fields.
    pub fn decode(token: &str) -> Result<Self, InvalidHistoryFormat> {
        let fields: Vec<&str> = token.split(HISTORY_DELIMITER).collect();
        if fields.len() != HISTORY_FIELD_COUNT {
            metrics::increment(MetricName::InvalidHistoryString);
            return Err(InvalidHistoryFormat {
                found: fields.len(),
            });
        }
        Ok(Self {
            event_timestamp_ms: fields[0].to_string(),
            component_id: fields[1].to_string(),
            intervention_code: fields[2].to_string(),
            intervention_reason: fields[3].to_string(),
            originating_component_id: fields[4].to_string(),
            originator_reference_id: fields[5].to_string(),
            requester_id: fields[6].to_string(),
        })
    }
}

/// Build the encoded history token for one applied intervention.
///
/// Fields missing from the event are encoded as empty strings so the field
/// count stays fixed.
#[must_use]
pub fn encode_history_entry(event: &IngressEvent, event_timestamp_ms: i64) -> String {
    let intervention = event
        .extensions
        .as_ref()
        .and_then(|extensions| extensions.intervention.as_ref());

    let field = |value: Option<&String>| value.cloned().unwrap_or_default();

    HistoryEntry {
        event_timestamp_ms: event_timestamp_ms.to_string(),
        component_id: event.component_id.clone(),
        intervention_code: field(intervention.map(|i| &i.intervention_code)),
        intervention_reason: field(intervention.map(|i| &i.intervention_reason)),
        originating_component_id: field(
            intervention.and_then(|i| i.originating_component_id.as_ref()),
        ),
        originator_reference_id: field(
            intervention.and_then(|i| i.originator_reference_id.as_ref()),
        ),
        requester_id: field(intervention.and_then(|i| i.requester_id.as_ref())),
    }
    .encode()
}
