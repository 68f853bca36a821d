//! Error types for ais-store.

use thiserror::Error;

/// Errors surfaced by storage collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The optimistic condition failed: the persisted flags no longer match
    /// the flags the mutation was resolved against. The caller owns retry
    /// policy.
    #[error("conditional check failed for account record")]
    Conflict,

    /// No record exists for the account.
    #[error("account record not found")]
    NotFound,

    /// The record is already marked deleted; no further writes may touch it.
    #[error("account record is marked as deleted")]
    AlreadyDeleted,

    /// The mutation named a field the record schema does not know.
    #[error("mutation touches unknown field {name}")]
    UnknownField { name: String },

    /// Backend-specific failure.
    #[error("storage error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
