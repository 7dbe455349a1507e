//! Subscription oracle contract.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use promo_store::UserId;

use crate::error::OracleError;
use crate::status::MembershipStatus;

/// Reports a user's current membership status in a channel.
#[async_trait]
pub trait SubscriptionOracle: Send + Sync {
    async fn membership_status(
        &self,
        channel: &str,
        user_id: UserId,
    ) -> Result<MembershipStatus, OracleError>;
}

#[async_trait]
impl<O: SubscriptionOracle + ?Sized> SubscriptionOracle for Arc<O> {
    #[inline]
    async fn membership_status(
        &self,
        channel: &str,
        user_id: UserId,
    ) -> Result<MembershipStatus, OracleError> {
        (**self).membership_status(channel, user_id).await
    }
}

#[async_trait]
impl<O: SubscriptionOracle + ?Sized> SubscriptionOracle for Box<O> {
    #[inline]
    async fn membership_status(
        &self,
        channel: &str,
        user_id: UserId,
    ) -> Result<MembershipStatus, OracleError> {
        (**self).membership_status(channel, user_id).await
    }
}

/// Oracle backed by a fixed status table.
///
/// Users missing from the table are reported as [`MembershipStatus::Left`].
/// The channel argument is ignored.
#[derive(Debug, Default)]
pub struct StaticOracle {
    statuses: RwLock<HashMap<UserId, MembershipStatus>>,
}

impl StaticOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`StaticOracle::set`].
    pub fn with(self, user_id: UserId, status: MembershipStatus) -> Self {
        self.set(user_id, status);
        self
    }

    /// Set or replace one user's status.
    pub fn set(&self, user_id: UserId, status: MembershipStatus) {
        self.statuses.write().insert(user_id, status);
    }
}

#[async_trait]
impl SubscriptionOracle for StaticOracle {
    async fn membership_status(
        &self,
        _channel: &str,
        user_id: UserId,
    ) -> Result<MembershipStatus, OracleError> {
        Ok(self
            .statuses
            .read()
            .get(&user_id)
            .copied()
            .unwrap_or(MembershipStatus::Left))
    }
}
