//! Error type constants for logging.
//!
//! These constants provide consistent error classification across all crates.

/// Subscription oracle failure (network, API error, bad payload).
pub const ERROR_ORACLE: &str = "oracle";
/// Record store unreachable or failing.
pub const ERROR_STORE: &str = "store";
/// Timeout error.
pub const ERROR_TIMEOUT: &str = "timeout";
/// Persisted data does not match the expected layout.
pub const ERROR_LAYOUT: &str = "layout";
/// Record expected to exist was not found.
pub const ERROR_MISSING_RECORD: &str = "missing_record";
/// Messaging API error.
pub const ERROR_TELEGRAM: &str = "telegram";
/// Configuration error.
pub const ERROR_CONFIG: &str = "config";
