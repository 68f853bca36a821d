//! Persistence layer for account intervention records.
//!
//! # Overview
//!
//! The engine in `ais-core` is pure: it resolves a transition and emits a
//! [`MutationDescriptor`]. This crate owns applying that descriptor to a
//! persisted [`AccountRecord`] behind the [`InterventionStore`] trait, with
//! the optimistic concurrency rule every backend must honor: a mutation is
//! applied only if the record's restriction flags still match the flags the
//! transition was resolved against.
//!
//! # Key Invariants
//!
//! - A mutation either applies atomically or fails with
//!   [`StoreError::Conflict`] leaving the record untouched.
//! - The store never retries: retry ownership sits with the caller, which
//!   re-reads and re-resolves.
//! - A record marked deleted never accepts another mutation.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod memory;
mod record;

pub use error::*;
pub use memory::*;
pub use record::*;

use ais_core::{AccountStateFlags, MutationDescriptor};
use async_trait::async_trait;

/// Storage interface for account intervention records.
#[async_trait]
pub trait InterventionStore: Send + Sync {
    /// Fetch the record for an account, if one exists.
    ///
    /// # Errors
    /// Returns a backend error when the read itself fails; an absent record
    /// is `Ok(None)`.
    async fn get(&self, account_id: &str) -> StoreResult<Option<AccountRecord>>;

    /// Apply a mutation, guarded by the flags the transition was resolved
    /// against.
    ///
    /// `expected` is `None` when the transition was resolved from the
    /// default state because no record existed; the write then creates the
    /// record and fails with [`StoreError::Conflict`] if one appeared in
    /// the meantime.
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] when the persisted flags no longer
    /// match `expected`, and [`StoreError::AlreadyDeleted`] when the record
    /// carries a deletion mark.
    async fn apply_mutation(
        &self,
        account_id: &str,
        expected: Option<AccountStateFlags>,
        mutation: &MutationDescriptor,
    ) -> StoreResult<AccountRecord>;

    /// Mark an account's record as deleted, at most once.
    ///
    /// Sets the deletion flag and a retention expiry; later mutations and
    /// repeat deletions are rejected.
    ///
    /// # Errors
    /// Returns [`StoreError::AlreadyDeleted`] when the record already
    /// carries a deletion mark.
    async fn mark_deleted(
        &self,
        account_id: &str,
        deleted_at_ms: i64,
        ttl_s: i64,
    ) -> StoreResult<()>;
}
