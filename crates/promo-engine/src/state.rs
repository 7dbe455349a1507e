//! Eligibility states and the pure decision function.
//!
//! Nothing here performs I/O. [`decide`] maps an oracle status, the current
//! record and the current time to a [`Decision`]; the engine carries it out.

use chrono::{DateTime, TimeDelta, Utc};
use promo_store::UserRecord;
use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;
use crate::status::MembershipStatus;

/// How a subscribed user with no record is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewUserPolicy {
    /// Record a stub without a window: the join time is unknown, so no code.
    #[default]
    Stub,
    /// Open the window at the time of the check and issue a code right away.
    Grant,
}

impl NewUserPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::Grant => "grant",
        }
    }
}

impl std::str::FromStr for NewUserPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "grant" => Ok(Self::Grant),
            other => Err(format!("unknown new user policy: {other} (expected stub or grant)")),
        }
    }
}

impl std::fmt::Display for NewUserPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Eligibility state of a user, derived from the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EligibilityState {
    /// No record.
    New,
    /// Record without a window and without a code.
    PendingLegacy,
    /// Window open, no code yet.
    WithinWindow,
    /// Window passed, or its start time is unreadable.
    Expired,
    /// Code issued. Terminal.
    Issued,
}

impl EligibilityState {
    /// Derive the state at `now` for a window of `window`.
    ///
    /// The edge is inclusive: `now - joined_at == window` is still within.
    pub fn derive(record: Option<&UserRecord>, now: DateTime<Utc>, window: TimeDelta) -> Self {
        let Some(record) = record else {
            return Self::New;
        };
        if record.has_code() {
            return Self::Issued;
        }
        match &record.joined_at {
            None => Self::PendingLegacy,
            Some(joined) => match joined.instant() {
                Some(at) if now - at <= window => Self::WithinWindow,
                _ => Self::Expired,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::PendingLegacy => "pending_legacy",
            Self::WithinWindow => "within_window",
            Self::Expired => "expired",
            Self::Issued => "issued",
        }
    }
}

/// What the engine must do for one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Answer without touching the store.
    Respond(Outcome),
    /// Insert a stub, then answer [`Outcome::SubscribedNoWindow`].
    CreateStub,
    /// Compare-and-set a fresh code on the existing record.
    IssueCode,
    /// Record `joined_at = now`, then issue a code.
    OpenWindowAndIssue,
}

/// Decide the action for a check.
pub fn decide(
    status: MembershipStatus,
    record: Option<&UserRecord>,
    now: DateTime<Utc>,
    window: TimeDelta,
    policy: NewUserPolicy,
) -> Decision {
    if !status.is_active() {
        return Decision::Respond(Outcome::NotSubscribed);
    }
    match EligibilityState::derive(record, now, window) {
        EligibilityState::Issued => Decision::Respond(Outcome::AlreadyRewarded),
        EligibilityState::New => match policy {
            NewUserPolicy::Stub => Decision::CreateStub,
            NewUserPolicy::Grant => Decision::OpenWindowAndIssue,
        },
        EligibilityState::PendingLegacy => Decision::Respond(Outcome::SubscribedNoWindow),
        EligibilityState::Expired => Decision::Respond(Outcome::WindowExpired),
        EligibilityState::WithinWindow => Decision::IssueCode,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use promo_store::{PromoCode, StoredTime, UserId};

    use super::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn day() -> TimeDelta {
        TimeDelta::hours(24)
    }

    fn joined(at: DateTime<Utc>) -> UserRecord {
        UserRecord::joined(UserId(1), None, at)
    }

    fn issued() -> UserRecord {
        UserRecord {
            code: Some(PromoCode::new("PROMO-ABCDEF")),
            code_issued_at: Some(StoredTime::At(t0())),
            ..joined(t0())
        }
    }

    #[test]
    fn test_window_edge_is_inclusive() {
        let now = t0() + day();
        assert_eq!(
            EligibilityState::derive(Some(&joined(t0())), now, day()),
            EligibilityState::WithinWindow
        );
        assert_eq!(
            EligibilityState::derive(Some(&joined(t0())), now + TimeDelta::seconds(1), day()),
            EligibilityState::Expired
        );
    }

    #[test]
    fn test_malformed_join_is_expired() {
        let record = UserRecord {
            joined_at: StoredTime::from_field("yesterday-ish"),
            ..UserRecord::stub(UserId(1), None)
        };
        assert_eq!(
            EligibilityState::derive(Some(&record), t0(), day()),
            EligibilityState::Expired
        );
    }

    #[test]
    fn test_code_wins_over_window() {
        // Even with an unreadable issue time the code alone makes it terminal.
        let record = UserRecord {
            code_issued_at: StoredTime::from_field("garbage"),
            ..issued()
        };
        assert_eq!(
            EligibilityState::derive(Some(&record), t0() + TimeDelta::days(30), day()),
            EligibilityState::Issued
        );
    }

    #[test]
    fn test_inactive_never_mutates() {
        for status in [
            MembershipStatus::Left,
            MembershipStatus::Kicked,
            MembershipStatus::Restricted,
            MembershipStatus::Unknown,
        ] {
            for record in [None, Some(joined(t0())), Some(issued())] {
                assert_eq!(
                    decide(status, record.as_ref(), t0(), day(), NewUserPolicy::Grant),
                    Decision::Respond(Outcome::NotSubscribed)
                );
            }
        }
    }

    #[test]
    fn test_decision_table() {
        let member = MembershipStatus::Member;
        let legacy = UserRecord::stub(UserId(1), None);
        let cases = [
            (None, NewUserPolicy::Stub, Decision::CreateStub),
            (None, NewUserPolicy::Grant, Decision::OpenWindowAndIssue),
            (
                Some(legacy.clone()),
                NewUserPolicy::Grant,
                Decision::Respond(Outcome::SubscribedNoWindow),
            ),
            (Some(joined(t0())), NewUserPolicy::Stub, Decision::IssueCode),
            (
                Some(joined(t0() - TimeDelta::hours(30))),
                NewUserPolicy::Stub,
                Decision::Respond(Outcome::WindowExpired),
            ),
            (
                Some(issued()),
                NewUserPolicy::Grant,
                Decision::Respond(Outcome::AlreadyRewarded),
            ),
        ];
        for (record, policy, expected) in cases {
            assert_eq!(decide(member, record.as_ref(), t0(), day(), policy), expected);
        }
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Grant".parse::<NewUserPolicy>().unwrap(), NewUserPolicy::Grant);
        assert_eq!(" stub ".parse::<NewUserPolicy>().unwrap(), NewUserPolicy::Stub);
        assert!("always".parse::<NewUserPolicy>().is_err());
    }
}
