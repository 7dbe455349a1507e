//! Configuration type definitions.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub promo: PromoConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bot API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token. May be left out of the file and supplied via `BOT_TOKEN`.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_bot_api_url")]
    pub api_url: String,
    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// HTTP request timeout. Must exceed the poll timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Back-off after a failed poll.
    #[serde(default = "default_poll_retry_delay_ms")]
    pub poll_retry_delay_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_bot_api_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            poll_retry_delay_ms: default_poll_retry_delay_ms(),
        }
    }
}

/// Promotion rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoConfig {
    /// Channel username (`@name`) or numeric chat id.
    #[serde(default)]
    pub channel_id: String,
    /// Eligibility window after the join, in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
    /// Treatment of subscribed users with no record: "stub" or "grant".
    #[serde(default = "default_new_user_policy")]
    pub new_user_policy: String,
    #[serde(default = "default_oracle_timeout_ms")]
    pub oracle_timeout_ms: u64,
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl PromoConfig {
    #[inline]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    #[inline]
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    #[inline]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

impl Default for PromoConfig {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            window_secs: default_window_secs(),
            code_prefix: default_code_prefix(),
            new_user_policy: default_new_user_policy(),
            oracle_timeout_ms: default_oracle_timeout_ms(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

/// Record store backend, selected by the `backend` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// In-process map; nothing survives a restart.
    Memory,
    /// Delimited file in the sheet layout.
    Sheet {
        #[serde(default = "default_sheet_path")]
        path: String,
    },
    /// SQL table (PostgreSQL, MySQL, or SQLite URL).
    Sql {
        url: String,
        #[serde(default = "default_sql_max_connections")]
        max_connections: u32,
        #[serde(default = "default_sql_connect_timeout_secs")]
        connect_timeout_secs: u64,
        /// Create the table at startup when missing.
        #[serde(default = "default_sql_init_schema")]
        init_schema: bool,
    },
}

impl StoreConfig {
    /// Backend name as written in the config file.
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sheet { .. } => "sheet",
            Self::Sql { .. } => "sql",
        }
    }

    /// SQL backend at `url` with default pool settings.
    pub fn sql(url: impl Into<String>) -> Self {
        Self::Sql {
            url: url.into(),
            max_connections: default_sql_max_connections(),
            connect_timeout_secs: default_sql_connect_timeout_secs(),
            init_schema: default_sql_init_schema(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sheet {
            path: default_sheet_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"promo_engine": "debug", "sqlx": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promo_defaults() {
        let cfg = PromoConfig::default();
        assert_eq!(cfg.window(), Duration::from_secs(24 * 60 * 60));
        assert_eq!(cfg.code_prefix, "PROMO");
        assert_eq!(cfg.new_user_policy, "stub");
        assert_eq!(cfg.oracle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn store_memory_deserialize() {
        let cfg: StoreConfig = toml::from_str(r#"backend = "memory""#).unwrap();
        assert!(matches!(cfg, StoreConfig::Memory));
        assert_eq!(cfg.backend(), "memory");
    }

    #[test]
    fn store_sql_requires_url() {
        let res: Result<StoreConfig, _> = toml::from_str(r#"backend = "sql""#);
        assert!(res.is_err());
    }

    #[test]
    fn store_sql_full() {
        let toml_str = r#"
backend = "sql"
url = "postgres://promo@localhost/promo"
max_connections = 20
connect_timeout_secs = 3
init_schema = false
"#;
        let cfg: StoreConfig = toml::from_str(toml_str).unwrap();
        match cfg {
            StoreConfig::Sql {
                url,
                max_connections,
                connect_timeout_secs,
                init_schema,
            } => {
                assert_eq!(url, "postgres://promo@localhost/promo");
                assert_eq!(max_connections, 20);
                assert_eq!(connect_timeout_secs, 3);
                assert!(!init_schema);
            }
            other => panic!("unexpected store: {other:?}"),
        }
    }

    #[test]
    fn logging_filters_deserialize() {
        let toml_str = r#"
level = "info"
format = "json"

[filters]
promo_bot = "debug"
sqlx = "warn"
"#;
        let cfg: LoggingConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.format.as_deref(), Some("json"));
        assert_eq!(cfg.filters.len(), 2);
    }
}
