//! # promo-rs
//!
//! Issues one-time promo codes to users who newly subscribe to a channel.
//!
//! ## Crates
//!
//! - [`promo_core`] - Shared defaults and error type strings
//! - [`promo_store`] - Subscriber record stores (memory, sheet, SQL)
//! - [`promo_engine`] - Eligibility rules and code issuance
//! - [`promo_config`] - Configuration loading and validation
//! - [`promo_bot`] - Telegram update loop

pub use promo_bot as bot;
pub use promo_config as config;
pub use promo_core as core;
pub use promo_engine as engine;
pub use promo_store as store;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use promo_bot::{Bot, BotError, CancellationToken, run, run_with_shutdown};
    pub use promo_config::{Config, load_config, validate_config};
    pub use promo_engine::{EligibilityEngine, EngineConfig, Outcome, SubscriptionOracle};
    pub use promo_store::{MemoryStore, RecordStore, SheetStore, UserRecord};
}
