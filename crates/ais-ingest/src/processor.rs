//! Event processing: guard rails, transition resolution, conditional write.

use ais_core::{
    metrics::{self, MetricName},
    ConfigurationError, IngressEvent, InterventionEvent, StateEngine, INTERVENTION_EVENT_NAME,
};
use ais_store::{AccountRecord, InterventionStore, StoreError};

use crate::error::IngestResult;

/// Conditional-write attempts per event: one initial write plus one
/// re-read and re-resolve after a conflict.
const CONFLICT_ATTEMPTS: u32 = 2;

/// Retention of a deleted record before expiry, in seconds (7 years).
pub const DEFAULT_DELETION_TTL_S: i64 = 7 * 365 * 86_400;

// ─────────────────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────────────────

/// Why an event was dropped without touching the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Event name or intervention payload not in the recognized set.
    UnknownEvent,
    /// Event timestamp is ahead of the processing clock.
    EventInFuture,
    /// The record carries a deletion mark.
    AccountDeleted,
    /// The event predates the intervention already applied.
    StaleEvent,
    /// The policy graph defines no edge for this event from the current
    /// state.
    TransitionNotAllowed,
}

/// Result of processing one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The transition applied; the record reflects the new state.
    Applied(AccountRecord),
    /// A guard rail dropped the event; the record is untouched.
    Ignored(IgnoreReason),
}

// ─────────────────────────────────────────────────────────────────────────────
// Processor
// ─────────────────────────────────────────────────────────────────────────────

/// Drives one event at a time through the guard rails, the transition
/// engine, and the store's conditional write.
///
/// Holds no per-event state; a single processor serves a whole queue.
pub struct EventProcessor<S> {
    engine: StateEngine,
    store: S,
    deletion_ttl_s: i64,
}

impl<S: InterventionStore> EventProcessor<S> {
    #[must_use]
    pub const fn new(engine: StateEngine, store: S) -> Self {
        Self {
            engine,
            store,
            deletion_ttl_s: DEFAULT_DELETION_TTL_S,
        }
    }

    /// Build a processor over the production policy graph.
    ///
    /// Registers metric descriptions with the installed recorder on first
    /// use.
    ///
    /// # Errors
    /// Returns a configuration error when the deployed graph fails
    /// validation.
    pub fn with_production_graph(store: S) -> Result<Self, ConfigurationError> {
        metrics::init_metrics();
        Ok(Self::new(StateEngine::with_production_graph()?, store))
    }

    #[must_use]
    pub const fn with_deletion_ttl(mut self, ttl_s: i64) -> Self {
        self.deletion_ttl_s = ttl_s;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Parse a raw queue payload and process it.
    ///
    /// # Errors
    /// Returns [`Malformed`](crate::IngestError::Malformed) when the payload is not a valid
    /// event, plus everything [`Self::process`] returns.
    pub async fn process_raw(&self, payload: &str, now_ms: i64) -> IngestResult<ProcessOutcome> {
        let event: IngressEvent = serde_json::from_str(payload).map_err(|error| {
            metrics::increment(MetricName::InvalidEventReceived);
            tracing::warn!(%error, "dropping malformed event payload");
            error
        })?;
        self.process(&event, now_ms).await
    }

    /// Process one ingress event against the account it names.
    ///
    /// Guard rails drop events without touching the record and report the
    /// reason as an [`Ignored`](ProcessOutcome::Ignored) outcome. After a
    /// write conflict the record is re-read and the transition re-resolved
    /// once; a second conflict is surfaced to the caller.
    ///
    /// # Errors
    /// Returns configuration and non-ignorable transition errors, and
    /// storage failures including an unresolved conflict.
    pub async fn process(&self, event: &IngressEvent, now_ms: i64) -> IngestResult<ProcessOutcome> {
        let account_id = event.user.user_id.as_str();

        let Some(kind) = Self::classify(event) else {
            return Ok(ProcessOutcome::Ignored(IgnoreReason::UnknownEvent));
        };

        let event_timestamp_ms = event.timestamp_ms();
        if event_timestamp_ms > now_ms {
            metrics::increment(MetricName::InterventionIgnoredInFuture);
            tracing::warn!(
                account_id,
                event = %kind,
                event_timestamp_ms,
                "event timestamp is in the future, dropping"
            );
            return Ok(ProcessOutcome::Ignored(IgnoreReason::EventInFuture));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let record = self.store.get(account_id).await?;

            if let Some(record) = &record {
                if record.is_account_deleted {
                    metrics::increment(MetricName::AccountIsMarkedAsDeleted);
                    tracing::warn!(account_id, "account is marked as deleted, dropping event");
                    return Ok(ProcessOutcome::Ignored(IgnoreReason::AccountDeleted));
                }
                // An intervention older than the one already applied is a
                // replay or out-of-order delivery.
                if !kind.is_user_led() {
                    if let Some(sent_at) = record.sent_at {
                        if event_timestamp_ms <= sent_at {
                            metrics::increment(MetricName::InterventionEventStale);
                            tracing::warn!(
                                account_id,
                                event = %kind,
                                event_timestamp_ms,
                                sent_at,
                                "event predates the applied intervention, dropping"
                            );
                            return Ok(ProcessOutcome::Ignored(IgnoreReason::StaleEvent));
                        }
                    }
                }
            }

            let expected = record.as_ref().map(AccountRecord::flags);
            let previous_applied_at_s = record
                .as_ref()
                .and_then(|r| r.applied_at)
                .unwrap_or(now_ms)
                .div_euclid(1000);

            let (resolved, mutation) = match self.engine.apply_event_transition(
                kind,
                expected,
                now_ms,
                event,
                previous_applied_at_s,
            ) {
                Ok(outcome) => outcome,
                Err(error) if error.is_ignorable() => {
                    tracing::warn!(account_id, event = %kind, %error, "dropping event");
                    return Ok(ProcessOutcome::Ignored(IgnoreReason::TransitionNotAllowed));
                }
                Err(error) => return Err(error.into()),
            };

            match self.store.apply_mutation(account_id, expected, &mutation).await {
                Ok(updated) => {
                    metrics::increment(MetricName::InterventionEventApplied);
                    metrics::record_delivery_latency(now_ms - event_timestamp_ms);
                    tracing::info!(
                        account_id,
                        event = %kind,
                        from = %resolved.from_node,
                        to = %resolved.to_node,
                        "transition applied"
                    );
                    return Ok(ProcessOutcome::Applied(updated));
                }
                Err(StoreError::Conflict) if attempt < CONFLICT_ATTEMPTS => {
                    metrics::increment(MetricName::DbUpdateConflict);
                    tracing::warn!(
                        account_id,
                        event = %kind,
                        attempt,
                        "conditional write conflict, re-resolving"
                    );
                }
                Err(error) => {
                    if error == StoreError::Conflict {
                        metrics::increment(MetricName::DbUpdateConflict);
                    }
                    return Err(error.into());
                }
            }
        }
    }

    /// Mark an account's record as deleted, fencing all later events.
    ///
    /// # Errors
    /// Surfaces storage failures; a repeat deletion is one.
    pub async fn mark_account_deleted(&self, account_id: &str, now_ms: i64) -> IngestResult<()> {
        match self
            .store
            .mark_deleted(account_id, now_ms, self.deletion_ttl_s)
            .await
        {
            Ok(()) => {
                metrics::increment(MetricName::MarkAsDeletedSucceeded);
                Ok(())
            }
            Err(error) => {
                metrics::increment(MetricName::MarkAsDeletedFailed);
                tracing::error!(account_id, %error, "failed to mark account as deleted");
                Err(error.into())
            }
        }
    }

    /// Identify the triggering event, or `None` when the payload is not
    /// recognized.
    fn classify(event: &IngressEvent) -> Option<InterventionEvent> {
        if event.event_name == INTERVENTION_EVENT_NAME {
            let code = event
                .extensions
                .as_ref()
                .and_then(|ext| ext.intervention.as_ref())
                .map(|details| details.intervention_code.as_str());
            let Some(code) = code else {
                metrics::increment(MetricName::InvalidEventReceived);
                tracing::warn!(
                    account_id = %event.user.user_id,
                    "intervention event carries no intervention block, dropping"
                );
                return None;
            };
            match InterventionEvent::from_intervention_code(code) {
                Ok(kind) => Some(kind),
                Err(error) => {
                    metrics::increment(MetricName::InterventionCodeNotFoundInConfig);
                    tracing::warn!(
                        account_id = %event.user.user_id,
                        code,
                        %error,
                        "unknown intervention code, dropping"
                    );
                    None
                }
            }
        } else {
            let kind = InterventionEvent::from_completion_name(&event.event_name);
            if kind.is_none() {
                metrics::increment(MetricName::InvalidEventReceived);
                tracing::warn!(
                    account_id = %event.user.user_id,
                    event_name = %event.event_name,
                    "unrecognized event name, dropping"
                );
            }
            kind
        }
    }
}
