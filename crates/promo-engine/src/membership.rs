//! Channel membership transitions.

use chrono::{DateTime, Utc};
use promo_store::UserId;

use crate::status::MembershipStatus;

/// A membership change observed in the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEvent {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub old_status: MembershipStatus,
    pub new_status: MembershipStatus,
    /// When the transition happened.
    pub at: DateTime<Utc>,
}

impl MembershipEvent {
    /// Whether this transition starts a subscription: left or kicked to an
    /// active status. Role changes and departures are not joins.
    ///
    /// A restricted user is still in the chat, so lifting a restriction
    /// (`restricted -> member`) does not start a window.
    #[inline]
    pub fn is_join(&self) -> bool {
        matches!(
            self.old_status,
            MembershipStatus::Left | MembershipStatus::Kicked
        ) && self.new_status.is_active()
    }
}

/// What a membership event did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    /// Not a join transition.
    Ignored,
    /// `joined_at` was written by this event.
    JoinRecorded,
    /// `joined_at` was already present and kept.
    JoinAlreadyKnown,
}
