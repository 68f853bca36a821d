//! In-memory store, used by tests and local tooling.

use std::collections::HashMap;

use ais_core::{AccountStateFlags, MutationDescriptor};
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::record::AccountRecord;
use crate::InterventionStore;

/// In-memory [`InterventionStore`] keyed by account id.
///
/// Conditional semantics match the production backend: the entire mutation
/// applies under one lock, or the record is left untouched.
#[derive(Debug, Default)]
pub struct MemoryInterventionStore {
    records: RwLock<HashMap<String, AccountRecord>>,
}

impl MemoryInterventionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, for test assertions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl InterventionStore for MemoryInterventionStore {
    async fn get(&self, account_id: &str) -> StoreResult<Option<AccountRecord>> {
        Ok(self.records.read().get(account_id).cloned())
    }

    async fn apply_mutation(
        &self,
        account_id: &str,
        expected: Option<AccountStateFlags>,
        mutation: &MutationDescriptor,
    ) -> StoreResult<AccountRecord> {
        let mut records = self.records.write();

        let mut next = match (records.get(account_id), expected) {
            (Some(existing), Some(flags)) => {
                if existing.is_account_deleted {
                    return Err(StoreError::AlreadyDeleted);
                }
                if existing.flags() != flags {
                    tracing::warn!(account_id, "conditional check failed, record moved on");
                    return Err(StoreError::Conflict);
                }
                existing.clone()
            }
            (None, None) => AccountRecord::default(),
            // Resolved against the default state but a record has since
            // appeared, or resolved against a record that has since gone.
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!(account_id, "conditional check failed, record moved on");
                return Err(StoreError::Conflict);
            }
        };

        next.apply(mutation)?;
        records.insert(account_id.to_string(), next.clone());
        Ok(next)
    }

    async fn mark_deleted(
        &self,
        account_id: &str,
        deleted_at_ms: i64,
        ttl_s: i64,
    ) -> StoreResult<()> {
        let mut records = self.records.write();
        let record = records.entry(account_id.to_string()).or_default();
        if record.is_account_deleted {
            return Err(StoreError::AlreadyDeleted);
        }
        record.is_account_deleted = true;
        record.updated_at = deleted_at_ms;
        record.ttl = Some(deleted_at_ms.div_euclid(1000) + ttl_s);
        tracing::info!(account_id, "account record marked as deleted");
        Ok(())
    }
}
