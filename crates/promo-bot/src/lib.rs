//! Telegram surface for the promo eligibility engine.
//!
//! Long-polls the Bot API, routes `/start`, `/check` and channel membership
//! changes into [`promo_engine::EligibilityEngine`], and answers users with
//! the resulting outcome.

pub mod cli;
mod dispatch;
mod error;
mod replies;
mod server;
mod telegram;

pub use cli::BotArgs;
pub use dispatch::{ChannelRef, Command, Route, parse_command, route};
pub use error::BotError;
pub use replies::Replies;
pub use server::{
    Bot, DEFAULT_SHUTDOWN_TIMEOUT, engine_config, open_store, run, run_with_shutdown,
};
pub use telegram::{Chat, TelegramClient, TelegramOracle, Update, User};
pub use tokio_util::sync::CancellationToken;
