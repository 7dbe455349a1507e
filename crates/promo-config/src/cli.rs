//! CLI override definitions and application logic.

use clap::Parser;

use crate::Config;
use crate::types::*;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override bot API token
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    /// Override bot API base URL
    #[arg(long)]
    pub api_url: Option<String>,
    /// Override channel (@name or numeric chat id)
    #[arg(long, env = "CHANNEL_ID")]
    pub channel_id: Option<String>,
    /// Override eligibility window (seconds)
    #[arg(long)]
    pub window_secs: Option<u64>,
    /// Override code prefix
    #[arg(long)]
    pub code_prefix: Option<String>,
    /// Override policy for subscribers without a record (stub, grant)
    #[arg(long)]
    pub new_user_policy: Option<String>,
    /// Use the SQL store at this URL
    #[arg(long, conflicts_with_all = ["sheet_path", "memory_store"])]
    pub database_url: Option<String>,
    /// Use the sheet store at this path
    #[arg(long, conflicts_with = "memory_store")]
    pub sheet_path: Option<String>,
    /// Use the in-memory store
    #[arg(long)]
    pub memory_store: bool,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.token {
        config.bot.token = v.clone();
    }
    if let Some(v) = &overrides.api_url {
        config.bot.api_url = v.clone();
    }
    if let Some(v) = &overrides.channel_id {
        config.promo.channel_id = v.clone();
    }
    if let Some(v) = overrides.window_secs {
        config.promo.window_secs = v;
    }
    if let Some(v) = &overrides.code_prefix {
        config.promo.code_prefix = v.clone();
    }
    if let Some(v) = &overrides.new_user_policy {
        config.promo.new_user_policy = v.to_ascii_lowercase();
    }
    // Store: a URL keeps the pool settings of an existing SQL section
    if let Some(v) = &overrides.database_url {
        match &mut config.store {
            StoreConfig::Sql { url, .. } => *url = v.clone(),
            other => *other = StoreConfig::sql(v.clone()),
        }
    } else if let Some(v) = &overrides.sheet_path {
        config.store = StoreConfig::Sheet { path: v.clone() };
    } else if overrides.memory_store {
        config.store = StoreConfig::Memory;
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_file_values() {
        let mut cfg = Config::default();
        cfg.promo.channel_id = "@old".into();
        let overrides = CliOverrides {
            token: Some("t".into()),
            channel_id: Some("@new".into()),
            window_secs: Some(60),
            new_user_policy: Some("GRANT".into()),
            log_level: Some("debug".into()),
            ..Default::default()
        };
        apply_overrides(&mut cfg, &overrides);
        assert_eq!(cfg.bot.token, "t");
        assert_eq!(cfg.promo.channel_id, "@new");
        assert_eq!(cfg.promo.window_secs, 60);
        assert_eq!(cfg.promo.new_user_policy, "grant");
        assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn database_url_keeps_pool_settings() {
        let mut cfg = Config {
            store: StoreConfig::Sql {
                url: "sqlite:a.db".into(),
                max_connections: 9,
                connect_timeout_secs: 1,
                init_schema: false,
            },
            ..Default::default()
        };
        let overrides = CliOverrides {
            database_url: Some("sqlite:b.db".into()),
            ..Default::default()
        };
        apply_overrides(&mut cfg, &overrides);
        match cfg.store {
            StoreConfig::Sql {
                url,
                max_connections,
                ..
            } => {
                assert_eq!(url, "sqlite:b.db");
                assert_eq!(max_connections, 9);
            }
            other => panic!("unexpected store: {other:?}"),
        }
    }

    #[test]
    fn database_url_switches_backend() {
        let mut cfg = Config::default();
        let overrides = CliOverrides {
            database_url: Some("sqlite:b.db".into()),
            ..Default::default()
        };
        apply_overrides(&mut cfg, &overrides);
        assert_eq!(cfg.store.backend(), "sql");
    }

    #[test]
    fn flags_parse() {
        let overrides = CliOverrides::try_parse_from([
            "promo",
            "--sheet-path",
            "list.csv",
            "--window-secs",
            "7200",
        ])
        .unwrap();
        assert_eq!(overrides.sheet_path.as_deref(), Some("list.csv"));
        assert_eq!(overrides.window_secs, Some(7200));
        assert!(
            CliOverrides::try_parse_from(["promo", "--sheet-path", "a.csv", "--memory-store"])
                .is_err()
        );
    }
}
