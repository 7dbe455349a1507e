//! Record store trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::record::{IssueOutcome, JoinOutcome, PromoCode, StubOutcome, UserId, UserRecord};

/// Persistent store holding one [`UserRecord`] per user.
///
/// Implementations must be thread-safe (`Send + Sync`): the engine calls them
/// concurrently for the same user (a join event racing a check, or a user
/// repeating a command). Correctness under that concurrency lives here, in the
/// conditional writes, not in callers:
///
/// - `upsert_join` never overwrites an existing `joined_at`.
/// - `issue_code` is a compare-and-set on an absent `code`.
/// - `create_stub` and `create_joined` only insert when no record exists.
///
/// Every mutating call is all-or-nothing.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Look up a user's record by exact key.
    ///
    /// Backends that can hold duplicate rows return the first and log a warning.
    async fn find(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError>;

    /// Record the start of a user's eligibility window.
    ///
    /// Creates the record if absent, sets `joined_at` if the record has none,
    /// and is a no-op otherwise.
    async fn upsert_join(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError>;

    /// Attach a code to an existing record, unless it already has one.
    ///
    /// # Returns
    /// * `Ok(IssueOutcome::Issued)` - the code and timestamp were written
    /// * `Ok(IssueOutcome::AlreadyIssued)` - a code was present at write time
    /// * `Err(StoreError::MissingRecord)` - no record for `user_id`
    async fn issue_code(
        &self,
        user_id: UserId,
        code: &PromoCode,
        issued_at: DateTime<Utc>,
    ) -> Result<IssueOutcome, StoreError>;

    /// Insert a bare record (no window, no code) if none exists.
    async fn create_stub(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
    ) -> Result<StubOutcome, StoreError>;

    /// Insert a record whose window opens at `joined_at`, if none exists.
    ///
    /// Unlike [`upsert_join`](Self::upsert_join), an existing record is never
    /// touched, so a stub cannot gain a window through this call.
    async fn create_joined(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<StubOutcome, StoreError>;

    /// All records, ordered by key. Used by administrative tooling.
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;
}

/// Blanket implementation for `Arc<S>` where `S: RecordStore`.
///
/// This allows sharing one backend between the engine and the update loop.
#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    #[inline]
    async fn find(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        (**self).find(user_id).await
    }

    #[inline]
    async fn upsert_join(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        (**self).upsert_join(user_id, display_name, joined_at).await
    }

    #[inline]
    async fn issue_code(
        &self,
        user_id: UserId,
        code: &PromoCode,
        issued_at: DateTime<Utc>,
    ) -> Result<IssueOutcome, StoreError> {
        (**self).issue_code(user_id, code, issued_at).await
    }

    #[inline]
    async fn create_stub(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
    ) -> Result<StubOutcome, StoreError> {
        (**self).create_stub(user_id, display_name).await
    }

    #[inline]
    async fn create_joined(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<StubOutcome, StoreError> {
        (**self).create_joined(user_id, display_name, joined_at).await
    }

    #[inline]
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        (**self).list().await
    }
}

/// Blanket implementation for `Box<S>` where `S: RecordStore`.
#[async_trait]
impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    #[inline]
    async fn find(&self, user_id: UserId) -> Result<Option<UserRecord>, StoreError> {
        (**self).find(user_id).await
    }

    #[inline]
    async fn upsert_join(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        (**self).upsert_join(user_id, display_name, joined_at).await
    }

    #[inline]
    async fn issue_code(
        &self,
        user_id: UserId,
        code: &PromoCode,
        issued_at: DateTime<Utc>,
    ) -> Result<IssueOutcome, StoreError> {
        (**self).issue_code(user_id, code, issued_at).await
    }

    #[inline]
    async fn create_stub(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
    ) -> Result<StubOutcome, StoreError> {
        (**self).create_stub(user_id, display_name).await
    }

    #[inline]
    async fn create_joined(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        joined_at: DateTime<Utc>,
    ) -> Result<StubOutcome, StoreError> {
        (**self).create_joined(user_id, display_name, joined_at).await
    }

    #[inline]
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        (**self).list().await
    }
}
