//! Engine and oracle error types.

use promo_core::{ERROR_ORACLE, ERROR_TIMEOUT};
use promo_store::StoreError;

/// Subscription oracle failure.
///
/// Never surfaces past the engine: every variant resolves to "not subscribed".
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// Transport or remote API failure.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// Lookup exceeded its time budget.
    #[error("oracle lookup timed out")]
    Timeout,
}

impl OracleError {
    #[inline]
    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        Self::Unavailable(err.to_string())
    }

    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => ERROR_ORACLE,
            Self::Timeout => ERROR_TIMEOUT,
        }
    }
}

/// Error returned by the eligibility engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The record store could not serve the decision path.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

impl EngineError {
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(e) => e.error_type(),
        }
    }
}
