//! Configuration validation logic.

use crate::defaults::max_code_prefix_len;
use crate::loader::ConfigError;
use crate::{Config, StoreConfig};

const NEW_USER_POLICIES: [&str; 2] = ["stub", "grant"];
const LOG_FORMATS: [&str; 3] = ["json", "pretty", "compact"];
const LOG_OUTPUTS: [&str; 2] = ["stdout", "stderr"];

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.bot.token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "bot.token is empty (set it in the file, via --token or BOT_TOKEN)".into(),
        ));
    }
    if config.bot.api_url.trim().is_empty() {
        return Err(ConfigError::Validation("bot.api_url is empty".into()));
    }
    if config.bot.request_timeout_secs <= config.bot.poll_timeout_secs {
        return Err(ConfigError::Validation(
            "bot.request_timeout_secs must be > bot.poll_timeout_secs".into(),
        ));
    }
    if config.promo.channel_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "promo.channel_id is empty (set it in the file, via --channel-id or CHANNEL_ID)"
                .into(),
        ));
    }
    if config.promo.window_secs == 0 {
        return Err(ConfigError::Validation(
            "promo.window_secs must be > 0".into(),
        ));
    }
    if config.promo.oracle_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "promo.oracle_timeout_ms must be > 0".into(),
        ));
    }
    if config.promo.store_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "promo.store_timeout_ms must be > 0".into(),
        ));
    }
    validate_code_prefix(&config.promo.code_prefix)?;
    if !NEW_USER_POLICIES.contains(&config.promo.new_user_policy.as_str()) {
        return Err(ConfigError::Validation(format!(
            "promo.new_user_policy must be one of: {:?}",
            NEW_USER_POLICIES
        )));
    }
    match &config.store {
        StoreConfig::Memory => {}
        StoreConfig::Sheet { path } => {
            if path.trim().is_empty() {
                return Err(ConfigError::Validation("store.path is empty".into()));
            }
        }
        StoreConfig::Sql {
            url,
            max_connections,
            ..
        } => {
            if url.trim().is_empty() {
                return Err(ConfigError::Validation("store.url is empty".into()));
            }
            if *max_connections == 0 {
                return Err(ConfigError::Validation(
                    "store.max_connections must be > 0".into(),
                ));
            }
        }
    }
    if let Some(format) = &config.logging.format
        && !LOG_FORMATS.contains(&format.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.format must be one of: {:?}",
            LOG_FORMATS
        )));
    }
    if let Some(output) = &config.logging.output
        && !LOG_OUTPUTS.contains(&output.as_str())
    {
        return Err(ConfigError::Validation(format!(
            "logging.output must be one of: {:?}",
            LOG_OUTPUTS
        )));
    }
    Ok(())
}

fn validate_code_prefix(prefix: &str) -> Result<(), ConfigError> {
    if prefix.is_empty() {
        return Err(ConfigError::Validation("promo.code_prefix is empty".into()));
    }
    if prefix.len() > max_code_prefix_len() {
        return Err(ConfigError::Validation(format!(
            "promo.code_prefix too long (max {})",
            max_code_prefix_len()
        )));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Validation(
            "promo.code_prefix may only contain ASCII letters, digits and '_'".into(),
        ));
    }
    Ok(())
}
