//! Subscriber record and the identifiers it is keyed by.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Stable user identifier.
///
/// Persisted as its decimal string, which is also the lookup key in
/// text-based backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<i64> for UserId {
    #[inline]
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// An issued promotional code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromoCode(String);

impl PromoCode {
    /// Wrap an already formatted code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A timestamp as read back from a store.
///
/// Stores hold text written by different generations of the bot, so a value
/// that does not parse is kept verbatim instead of failing the whole lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredTime {
    /// A well-formed instant.
    At(DateTime<Utc>),
    /// Raw text that did not parse as a timestamp.
    Malformed(String),
}

impl StoredTime {
    /// Parse a persisted field. Empty (or whitespace) text is absent.
    pub fn from_field(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(match timestamp::parse(raw) {
            Some(at) => Self::At(at),
            None => Self::Malformed(raw.to_string()),
        })
    }

    /// The instant, if well-formed.
    #[inline]
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(at) => Some(*at),
            Self::Malformed(_) => None,
        }
    }

    /// Text written back to a store. Malformed values round-trip unchanged.
    pub fn to_field(&self) -> String {
        match self {
            Self::At(at) => timestamp::format(*at),
            Self::Malformed(raw) => raw.clone(),
        }
    }
}

impl From<DateTime<Utc>> for StoredTime {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

/// One subscriber as known to the store.
///
/// `code` and `joined_at` are write-once: backends never overwrite them once
/// present. `display_name` is informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub display_name: Option<String>,
    pub code: Option<PromoCode>,
    pub code_issued_at: Option<StoredTime>,
    pub joined_at: Option<StoredTime>,
}

impl UserRecord {
    /// A bare record: identity only, no window, no code.
    pub fn stub(user_id: UserId, display_name: Option<&str>) -> Self {
        Self {
            user_id,
            display_name: non_empty(display_name),
            code: None,
            code_issued_at: None,
            joined_at: None,
        }
    }

    /// A record whose eligibility window starts at `joined_at`.
    pub fn joined(user_id: UserId, display_name: Option<&str>, joined_at: DateTime<Utc>) -> Self {
        Self {
            joined_at: Some(StoredTime::At(joined_at)),
            ..Self::stub(user_id, display_name)
        }
    }

    /// Whether a code has been issued.
    #[inline]
    pub fn has_code(&self) -> bool {
        self.code.is_some()
    }

    /// Whether the join timestamp has been recorded (well-formed or not).
    #[inline]
    pub fn has_joined_at(&self) -> bool {
        self.joined_at.is_some()
    }
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Result of [`RecordStore::upsert_join`](crate::RecordStore::upsert_join).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// No record existed; one was created with the join timestamp.
    Created,
    /// A record without a join timestamp existed; the timestamp was set.
    WindowOpened,
    /// The record already had a join timestamp; nothing changed.
    AlreadyJoined,
}

impl JoinOutcome {
    /// Whether the call changed the store.
    #[inline]
    pub fn is_mutation(self) -> bool {
        !matches!(self, Self::AlreadyJoined)
    }
}

/// Result of [`RecordStore::issue_code`](crate::RecordStore::issue_code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    /// The code was written.
    Issued,
    /// The record already carried a code at write time; nothing changed.
    AlreadyIssued,
}

/// Result of an insert-only write:
/// [`create_stub`](crate::RecordStore::create_stub) or
/// [`create_joined`](crate::RecordStore::create_joined).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubOutcome {
    Created,
    AlreadyExists,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_user_id_parse_and_display() {
        let id: UserId = " 123456789 ".parse().unwrap();
        assert_eq!(id, UserId(123456789));
        assert_eq!(id.to_string(), "123456789");
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn test_stored_time_from_field() {
        assert_eq!(StoredTime::from_field(""), None);
        assert_eq!(StoredTime::from_field("   "), None);

        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            StoredTime::from_field("2025-03-01T12:00:00Z"),
            Some(StoredTime::At(at))
        );
        assert_eq!(
            StoredTime::from_field("yesterday"),
            Some(StoredTime::Malformed("yesterday".to_string()))
        );
    }

    #[test]
    fn test_malformed_round_trips_verbatim() {
        let t = StoredTime::Malformed("31/02/2024".to_string());
        assert_eq!(t.to_field(), "31/02/2024");
        assert_eq!(t.instant(), None);
    }

    #[test]
    fn test_stub_drops_blank_display_name() {
        let record = UserRecord::stub(UserId(1), Some("  "));
        assert_eq!(record.display_name, None);
        assert!(!record.has_code());
        assert!(!record.has_joined_at());
    }
}
