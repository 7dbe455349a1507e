//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `promo_core::defaults`.

use promo_core::defaults;

/// Generate default value functions that forward to promo_core::defaults constants.
macro_rules! default_fns {
    // For Copy types (integers, bool, etc.)
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

/// Generate default value functions that return String from &str constants.
macro_rules! default_string_fns {
    ($($fn_name:ident => $const_name:ident),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> String {
                defaults::$const_name.to_string()
            }
        )*
    };
}

default_fns! {
    default_poll_timeout_secs      => DEFAULT_POLL_TIMEOUT_SECS: u64,
    default_request_timeout_secs   => DEFAULT_REQUEST_TIMEOUT_SECS: u64,
    default_poll_retry_delay_ms    => DEFAULT_POLL_RETRY_DELAY_MS: u64,
    default_window_secs            => DEFAULT_WINDOW_SECS: u64,
    default_oracle_timeout_ms      => DEFAULT_ORACLE_TIMEOUT_MS: u64,
    default_store_timeout_ms       => DEFAULT_STORE_TIMEOUT_MS: u64,
    default_sql_max_connections    => DEFAULT_SQL_MAX_CONNECTIONS: u32,
    default_sql_connect_timeout_secs => DEFAULT_SQL_CONNECT_TIMEOUT_SECS: u64,
    default_sql_init_schema        => DEFAULT_SQL_INIT_SCHEMA: bool,
    max_code_prefix_len            => MAX_CODE_PREFIX_LEN: usize,
}

default_string_fns! {
    default_bot_api_url     => DEFAULT_BOT_API_URL,
    default_code_prefix     => DEFAULT_CODE_PREFIX,
    default_new_user_policy => DEFAULT_NEW_USER_POLICY,
    default_sheet_path      => DEFAULT_SHEET_PATH,
}
