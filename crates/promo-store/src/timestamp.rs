//! Canonical timestamp text for persisted records.
//!
//! Written as RFC 3339 in UTC with microseconds and a `Z` suffix, e.g.
//! `2025-03-01T12:00:00.000000Z`. Reading is lenient: any RFC 3339 offset is
//! normalized to UTC, and offset-less ISO-8601 text (as produced by older
//! versions of the bot) is taken as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Offset-less layouts accepted on read, tried in order.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Format an instant in the canonical layout.
#[inline]
pub fn format(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse persisted timestamp text. Returns `None` if no accepted layout matches.
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|layout| {
        NaiveDateTime::parse_from_str(raw, layout)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}
