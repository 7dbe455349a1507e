//! Bot error types.

use promo_config::ConfigError;
use promo_core::{ERROR_CONFIG, ERROR_TELEGRAM};
use promo_engine::EngineError;
use promo_store::StoreError;

/// Bot error type.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    /// The Bot API answered with `ok: false`.
    #[error("bot api: {description} (code {code:?})")]
    Api {
        code: Option<i64>,
        description: String,
    },
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("engine: {0}")]
    Engine(#[from] EngineError),
}

impl BotError {
    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            BotError::Http(_) | BotError::Api { .. } => ERROR_TELEGRAM,
            BotError::Config(_) => ERROR_CONFIG,
            BotError::Store(e) => e.error_type(),
            BotError::Engine(e) => e.error_type(),
        }
    }
}
