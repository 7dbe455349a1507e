//! Record store error types.

use promo_core::{ERROR_LAYOUT, ERROR_MISSING_RECORD, ERROR_STORE, ERROR_TIMEOUT};

use crate::record::UserId;

/// Record store error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or failing (database, file system, network).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Backend call exceeded its time budget.
    #[error("store call timed out")]
    Timeout,

    /// A write targeted a record that does not exist.
    #[error("no record for user {0}")]
    MissingRecord(UserId),

    /// Persisted data does not match the expected layout.
    #[error("layout: {0}")]
    Layout(String),
}

impl StoreError {
    /// Create an unavailable error from any error type.
    #[inline]
    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        Self::Unavailable(err.to_string())
    }

    /// Whether the backend could not be reached at all.
    #[inline]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout)
    }

    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => ERROR_STORE,
            Self::Timeout => ERROR_TIMEOUT,
            Self::MissingRecord(_) => ERROR_MISSING_RECORD,
            Self::Layout(_) => ERROR_LAYOUT,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::unavailable(err)
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            Self::unavailable(err)
        } else {
            Self::Layout(err.to_string())
        }
    }
}

#[cfg(feature = "sql")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::unavailable(err)
    }
}
