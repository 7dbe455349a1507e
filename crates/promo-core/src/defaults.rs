//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Eligibility Defaults
// ============================================================================

/// Default eligibility window in seconds (24 hours).
pub const DEFAULT_WINDOW_SECS: u64 = 24 * 60 * 60;
/// Default promo code prefix.
pub const DEFAULT_CODE_PREFIX: &str = "PROMO";
/// Number of random bytes behind the code suffix (rendered as 2x hex chars).
pub const CODE_SUFFIX_BYTES: usize = 3;
/// Maximum accepted length of a code prefix.
pub const MAX_CODE_PREFIX_LEN: usize = 16;
/// Default policy for active users with no record ("stub" or "grant").
pub const DEFAULT_NEW_USER_POLICY: &str = "stub";

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Default subscription oracle call timeout in milliseconds.
pub const DEFAULT_ORACLE_TIMEOUT_MS: u64 = 5_000;
/// Default record store call timeout in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Bot API Defaults
// ============================================================================

/// Default Telegram Bot API base URL.
pub const DEFAULT_BOT_API_URL: &str = "https://api.telegram.org";
/// Default long-poll timeout in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;
/// Default HTTP request timeout in seconds (must exceed the poll timeout).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 40;
/// Delay before retrying a failed poll, in milliseconds.
pub const DEFAULT_POLL_RETRY_DELAY_MS: u64 = 2_000;

// ============================================================================
// Store Defaults
// ============================================================================

/// Default maximum SQL pool connections.
pub const DEFAULT_SQL_MAX_CONNECTIONS: u32 = 5;
/// Default SQL pool acquire timeout in seconds.
pub const DEFAULT_SQL_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Create the SQL table on startup when missing.
pub const DEFAULT_SQL_INIT_SCHEMA: bool = true;
/// Default sheet file path.
pub const DEFAULT_SHEET_PATH: &str = "subscribers.csv";

// ============================================================================
// Logging Defaults
// ============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
