//! Long-poll update loop.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use promo_config::{Config, ConfigError, PromoConfig, StoreConfig};
use promo_engine::{EligibilityEngine, EngineConfig, NewUserPolicy};
use promo_store::sql::{SqlStore, SqlStoreConfig};
use promo_store::{MemoryStore, RecordStore, SheetStore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::dispatch::{ChannelRef, Command, Route, route};
use crate::error::BotError;
use crate::replies::Replies;
use crate::telegram::{TelegramClient, TelegramOracle, Update, User};

/// Default time to wait for in-flight updates on shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the bot until a shutdown signal is received.
pub async fn run(config: Config) -> Result<(), BotError> {
    run_with_shutdown(config, CancellationToken::new()).await
}

/// Run the bot with an external shutdown token.
///
/// Opens the configured store, wires the engine to the Bot API and polls
/// until the token is cancelled.
pub async fn run_with_shutdown(
    config: Config,
    shutdown: CancellationToken,
) -> Result<(), BotError> {
    let store = open_store(&config.store).await?;
    info!(backend = config.store.backend(), "record store ready");

    let client = TelegramClient::new(&config.bot)?;
    let oracle = TelegramOracle::new(client.clone());
    let engine_config = engine_config(&config.promo)?;
    info!(
        channel = %engine_config.channel_id,
        window_secs = engine_config.window.as_secs(),
        policy = %engine_config.new_user_policy,
        "eligibility engine configured"
    );
    let engine = EligibilityEngine::new(engine_config, store, oracle);

    Bot::new(&config, client, engine).run(shutdown).await
}

/// Build the engine configuration from the `[promo]` section.
pub fn engine_config(promo: &PromoConfig) -> Result<EngineConfig, BotError> {
    let policy: NewUserPolicy = promo
        .new_user_policy
        .parse()
        .map_err(ConfigError::Validation)?;
    Ok(EngineConfig::new(promo.channel_id.trim())
        .window(promo.window())
        .new_user_policy(policy)
        .oracle_timeout(promo.oracle_timeout())
        .store_timeout(promo.store_timeout())
        .code_prefix(promo.code_prefix.clone()))
}

/// Open the configured record store.
pub async fn open_store(config: &StoreConfig) -> Result<Box<dyn RecordStore>, BotError> {
    Ok(match config {
        StoreConfig::Memory => {
            warn!("memory store selected, records are lost on restart");
            Box::new(MemoryStore::new())
        }
        StoreConfig::Sheet { path } => Box::new(SheetStore::open(path).await?),
        StoreConfig::Sql {
            url,
            max_connections,
            connect_timeout_secs,
            init_schema,
        } => {
            let sql = SqlStoreConfig::new(url.as_str())
                .max_connections(*max_connections)
                .connect_timeout(Duration::from_secs(*connect_timeout_secs))
                .init_schema(*init_schema);
            Box::new(SqlStore::connect(sql).await?)
        }
    })
}

/// The bot: an update loop feeding the eligibility engine.
pub struct Bot {
    client: TelegramClient,
    engine: Arc<EligibilityEngine>,
    channel: ChannelRef,
    replies: Replies,
    username: Option<String>,
    poll_timeout_secs: u64,
    retry_delay: Duration,
}

impl Bot {
    pub fn new(config: &Config, client: TelegramClient, engine: EligibilityEngine) -> Self {
        let channel = ChannelRef::parse(&config.promo.channel_id);
        let replies = Replies::new(channel.link(), config.promo.window());
        Self {
            client,
            engine: Arc::new(engine),
            channel,
            replies,
            username: None,
            poll_timeout_secs: config.bot.poll_timeout_secs,
            retry_delay: Duration::from_millis(config.bot.poll_retry_delay_ms),
        }
    }

    /// Poll and handle updates until `shutdown` fires.
    ///
    /// Each update runs on its own task, so checks and membership events for
    /// the same user may execute concurrently.
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), BotError> {
        let me = self.client.get_me().await?;
        self.username = me.username;
        info!(
            username = self.username.as_deref().unwrap_or(""),
            channel = %self.channel,
            "bot started"
        );

        let bot = Arc::new(self);
        let mut tasks = JoinSet::new();
        let mut offset: Option<i64> = None;
        // Updates spawned but not yet finished. A task that panics stays
        // here, so its update is redelivered after a restart.
        let mut pending = BTreeSet::new();

        loop {
            while let Some(done) = tasks.try_join_next() {
                finish(&mut pending, done);
            }

            let polled = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("shutdown signal received, stopping poll loop");
                    break;
                }

                result = bot.client.get_updates(offset, bot.poll_timeout_secs) => result,
            };

            match polled {
                Ok(updates) => {
                    debug!(count = updates.len(), "updates received");
                    for update in updates {
                        let update_id = update.update_id;
                        offset = Some(update_id + 1);
                        pending.insert(update_id);
                        let bot = bot.clone();
                        tasks.spawn(async move {
                            bot.handle(update).await;
                            update_id
                        });
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        error_type = e.error_type(),
                        retry_ms = bot.retry_delay.as_millis() as u64,
                        "poll failed"
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(bot.retry_delay) => {}
                    }
                }
            }
        }

        // Graceful drain: let in-flight updates finish
        if !tasks.is_empty() {
            info!("waiting for {} in-flight updates", tasks.len());
            let drain = async {
                while let Some(done) = tasks.join_next().await {
                    finish(&mut pending, done);
                }
            };
            if tokio::time::timeout(DEFAULT_SHUTDOWN_TIMEOUT, drain).await.is_err() {
                warn!("shutdown timeout, {} updates aborted", tasks.len());
                tasks.abort_all();
            }
        }

        if !pending.is_empty() {
            warn!(
                count = pending.len(),
                "updates not completed, they will be redelivered on restart"
            );
        }

        // Acknowledge only the completed prefix so nothing unfinished is lost
        if let Some(ack) = ack_offset(offset, &pending)
            && let Err(e) = bot.client.get_updates(Some(ack), 0).await
        {
            warn!(error = %e, "failed to acknowledge last updates");
        }

        info!("bot stopped");
        Ok(())
    }

    async fn handle(&self, update: Update) {
        let update_id = update.update_id;
        match route(update, &self.channel, self.username.as_deref()) {
            Route::Command {
                chat_id,
                user,
                command,
            } => {
                let text = self.answer(&user, command).await;
                if let Err(e) = self.client.send_message(chat_id, &text).await {
                    warn!(update_id, chat_id, error = %e, "failed to send reply");
                }
            }
            Route::Membership(event) => match self.engine.on_membership(&event).await {
                Ok(action) => debug!(update_id, user_id = %event.user_id, ?action, "membership handled"),
                Err(e) => error!(
                    update_id,
                    user_id = %event.user_id,
                    error = %e,
                    error_type = e.error_type(),
                    "membership event failed"
                ),
            },
            Route::Ignore => debug!(update_id, "update ignored"),
        }
    }

    async fn answer(&self, user: &User, command: Command) -> String {
        let user_id = user.user_id();
        let name = user.display_name();
        let result = match command {
            Command::Start => self
                .engine
                .greet(user_id, name)
                .await
                .map(|greeting| self.replies.greeting(greeting)),
            Command::Check => self
                .engine
                .check(user_id, name)
                .await
                .map(|outcome| self.replies.outcome(&outcome)),
        };
        result.unwrap_or_else(|e| {
            error!(
                user_id = %user_id,
                ?command,
                error = %e,
                error_type = e.error_type(),
                "command failed"
            );
            self.replies.unavailable()
        })
    }
}

/// Record a finished update task.
fn finish(pending: &mut BTreeSet<i64>, done: Result<i64, JoinError>) {
    match done {
        Ok(update_id) => {
            pending.remove(&update_id);
        }
        Err(e) => error!(error = %e, "update task failed"),
    }
}

/// Offset to confirm on shutdown: everything before the oldest unfinished
/// update, or everything fetched when all updates finished.
fn ack_offset(next: Option<i64>, pending: &BTreeSet<i64>) -> Option<i64> {
    pending.first().copied().or(next)
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("channel", &self.channel)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
