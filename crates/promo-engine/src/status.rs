//! Channel membership status as reported by the oracle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Membership status of a user in the channel.
///
/// Mirrors the status strings of the Bot API `ChatMember` object. Anything
/// unrecognized deserializes to [`MembershipStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    #[serde(other)]
    Unknown,
}

impl MembershipStatus {
    /// Whether the status counts as an active subscription.
    ///
    /// Only member, administrator and creator are active. Restricted users
    /// may have lost channel rights and unknown means the lookup failed, so
    /// both fail closed.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Creator | Self::Administrator | Self::Member)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Creator => "creator",
            Self::Administrator => "administrator",
            Self::Member => "member",
            Self::Restricted => "restricted",
            Self::Left => "left",
            Self::Kicked => "kicked",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_statuses() {
        assert!(MembershipStatus::Creator.is_active());
        assert!(MembershipStatus::Administrator.is_active());
        assert!(MembershipStatus::Member.is_active());
        assert!(!MembershipStatus::Restricted.is_active());
        assert!(!MembershipStatus::Left.is_active());
        assert!(!MembershipStatus::Kicked.is_active());
        assert!(!MembershipStatus::Unknown.is_active());
    }

    #[test]
    fn test_unknown_status_string() {
        let status: MembershipStatus = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(status, MembershipStatus::Unknown);
        let status: MembershipStatus = serde_json::from_str("\"kicked\"").unwrap();
        assert_eq!(status, MembershipStatus::Kicked);
    }
}
