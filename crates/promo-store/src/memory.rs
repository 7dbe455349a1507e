//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::error::StoreError;
use crate::record::{
    IssueOutcome, JoinOutcome, PromoCode, StoredTime, StubOutcome, UserId, UserRecord, non_empty,
};
use crate::traits::RecordStore;

/// Record store held in process memory.
///
/// Every mutation runs under the write lock, so the conditional writes are
/// natively atomic. Suitable for tests and single-process trial runs; nothing
/// survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<UserId, UserRecord>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records (later duplicates win).
    ///
    /// # Example
    /// ```
    /// use promo_store::{MemoryStore, UserId, UserRecord};
    ///
    /// let store = MemoryStore::from_records([UserRecord::stub(UserId(1), Some("alice"))]);
    /// assert_eq!(store.len(), 1);
    /// ```
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = UserRecord>,
    {
        let records = records.into_iter().map(|r| (r.user_id, r)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Get the number of known users.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if no users are known.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Snapshot of one record, without going through the async trait.
    #[inline]
    pub fn get(&self, user_id: UserId) -> Option<UserRecord> {
        self.records.read().get(&user_id).cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.get(user_id))
    }

    async fn upsert_join(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        let mut records = self.records.write();
        match records.get_mut(&user_id) {
            None => {
                records.insert(user_id, UserRecord::joined(user_id, display_name, joined_at));
                Ok(JoinOutcome::Created)
            }
            Some(record) if record.joined_at.is_some() => Ok(JoinOutcome::AlreadyJoined),
            Some(record) => {
                record.joined_at = Some(StoredTime::At(joined_at));
                if record.display_name.is_none() {
                    record.display_name = non_empty(display_name);
                }
                Ok(JoinOutcome::WindowOpened)
            }
        }
    }

    async fn issue_code(
        &self,
        user_id: UserId,
        code: &PromoCode,
        issued_at: DateTime<Utc>,
    ) -> Result<IssueOutcome, StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(&user_id)
            .ok_or(StoreError::MissingRecord(user_id))?;
        if record.code.is_some() {
            return Ok(IssueOutcome::AlreadyIssued);
        }
        record.code = Some(code.clone());
        record.code_issued_at = Some(StoredTime::At(issued_at));
        Ok(IssueOutcome::Issued)
    }

    async fn create_stub(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
    ) -> Result<StubOutcome, StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&user_id) {
            return Ok(StubOutcome::AlreadyExists);
        }
        records.insert(user_id, UserRecord::stub(user_id, display_name));
        Ok(StubOutcome::Created)
    }

    async fn create_joined(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<StubOutcome, StoreError> {
        let mut records = self.records.write();
        if records.contains_key(&user_id) {
            return Ok(StubOutcome::AlreadyExists);
        }
        records.insert(user_id, UserRecord::joined(user_id, display_name, joined_at));
        Ok(StubOutcome::Created)
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut all: Vec<_> = self.records.read().values().cloned().collect();
        all.sort_by_key(|r| r.user_id);
        Ok(all)
    }
}
