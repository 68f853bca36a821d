//! Error types for ais-ingest.

use ais_core::{ConfigurationError, TransitionError};
use ais_store::StoreError;
use thiserror::Error;

/// Errors that abort processing of an event.
///
/// Drops caused by guard rails are not errors; they surface as ignored
/// outcomes so the caller can acknowledge the message.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The event payload could not be parsed.
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The deployed policy configuration is defective.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The transition could not be resolved for a non-ignorable reason.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The storage layer failed, including a conflict that survived the
    /// bounded re-read and re-resolve.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for ingestion operations.
pub type IngestResult<T> = Result<T, IngestError>;
