//! Metric emission for the intervention engine.
//!
//! Metric names form a closed enumeration so dashboards and alarms can rely
//! on the full set. Emission goes through the `metrics` facade; the hosting
//! process installs whichever recorder it wants.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_histogram, histogram};

static METRICS_INITIALIZED: OnceLock<bool> = OnceLock::new();

/// Closed set of diagnostic and outcome metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Engine diagnostics
    StateNotFoundInCurrentConfig,
    NoTransitionsFoundInConfig,
    StateTransitionNotAllowedOrIgnored,
    TransitionSameAsCurrentState,
    InterventionDidNotHaveNameInCurrentConfig,
    InterventionCodeNotFoundInConfig,
    InvalidStateEngineConfiguration,
    InvalidHistoryString,

    // Ingestion outcomes
    InvalidEventReceived,
    InterventionIgnoredInFuture,
    InterventionEventStale,
    InterventionEventApplied,

    // Storage outcomes
    DbUpdateConflict,
    AccountIsMarkedAsDeleted,
    MarkAsDeletedSucceeded,
    MarkAsDeletedFailed,
}

impl MetricName {
    /// Get the recorder-facing metric name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StateNotFoundInCurrentConfig => "ais_state_not_found_in_current_config",
            Self::NoTransitionsFoundInConfig => "ais_no_transitions_found_in_config",
            Self::StateTransitionNotAllowedOrIgnored => {
                "ais_state_transition_not_allowed_or_ignored"
            }
            Self::TransitionSameAsCurrentState => "ais_transition_same_as_current_state",
            Self::InterventionDidNotHaveNameInCurrentConfig => {
                "ais_intervention_did_not_have_name_in_current_config"
            }
            Self::InterventionCodeNotFoundInConfig => "ais_intervention_code_not_found_in_config",
            Self::InvalidStateEngineConfiguration => "ais_invalid_state_engine_configuration",
            Self::InvalidHistoryString => "ais_invalid_history_string",
            Self::InvalidEventReceived => "ais_invalid_event_received",
            Self::InterventionIgnoredInFuture => "ais_intervention_ignored_in_future",
            Self::InterventionEventStale => "ais_intervention_event_stale",
            Self::InterventionEventApplied => "ais_intervention_event_applied",
            Self::DbUpdateConflict => "ais_db_update_conflict",
            Self::AccountIsMarkedAsDeleted => "ais_account_is_marked_as_deleted",
            Self::MarkAsDeletedSucceeded => "ais_mark_as_deleted_succeeded",
            Self::MarkAsDeletedFailed => "ais_mark_as_deleted_failed",
        }
    }
}

/// What a [`TIME_TO_RESOLVE`](TIME_TO_RESOLVE) observation measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    PasswordReset,
    ReproveIdentity,
    Suspension,
}

impl ResolutionKind {
    /// Label value for the latency histogram.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::ReproveIdentity => "reprove_identity",
            Self::Suspension => "suspension",
        }
    }
}

/// Latency histogram: seconds between an intervention being applied and the
/// user resolving it.
pub const TIME_TO_RESOLVE: &str = "ais_time_to_resolve_seconds";

/// Latency histogram: milliseconds between event emission and processing.
pub const EVENT_DELIVERY_LATENCY: &str = "ais_event_delivery_latency_ms";

/// Register metric descriptions with the installed recorder.
pub fn init_metrics() {
    if METRICS_INITIALIZED.set(true).is_err() {
        return; // Already initialized
    }

    describe_counter!(
        MetricName::InterventionEventApplied.as_str(),
        "Intervention events applied to an account record"
    );
    describe_counter!(
        MetricName::StateTransitionNotAllowedOrIgnored.as_str(),
        "Events ignored because the transition is not legal from the current state"
    );
    describe_counter!(
        MetricName::InvalidStateEngineConfiguration.as_str(),
        "Fatal policy graph validation failures"
    );
    describe_counter!(
        MetricName::DbUpdateConflict.as_str(),
        "Conditional writes rejected because the record moved underneath us"
    );
    describe_histogram!(
        TIME_TO_RESOLVE,
        "Seconds between an intervention being applied and the user resolving it"
    );
    describe_histogram!(
        EVENT_DELIVERY_LATENCY,
        "Milliseconds between event emission and processing"
    );
}

/// Increment a named outcome counter by 1.
pub fn increment(name: MetricName) {
    counter!(name.as_str()).increment(1);
}

/// Record a resolution-time observation in seconds.
#[allow(clippy::cast_precision_loss)]
pub fn record_time_to_resolve(kind: ResolutionKind, seconds: i64) {
    histogram!(TIME_TO_RESOLVE, "resolution" => kind.as_str()).record(seconds as f64);
}

/// Record the delivery latency of one event in milliseconds.
#[allow(clippy::cast_precision_loss)]
pub fn record_delivery_latency(latency_ms: i64) {
    histogram!(EVENT_DELIVERY_LATENCY).record(latency_ms as f64);
}
