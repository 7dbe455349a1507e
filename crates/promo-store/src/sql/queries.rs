//! SQL statements for each supported dialect.
//!
//! Every mutation is a single conditional statement; callers judge the result
//! by rows affected, never by a prior read.
//!
//! `init_schema` keys the table on `user_id`, so a user has at most one row.
//! Tables created by hand without that key may hold duplicates; SQLite `find`
//! then orders by `rowid` so the first inserted row wins. PostgreSQL and
//! MySQL have no stable insertion order and rely on the primary key.

/// Statements for one SQL dialect.
#[derive(Debug)]
pub struct Queries {
    pub create_table: &'static str,
    pub find: &'static str,
    pub list: &'static str,
    /// Insert with `joined_at` set, only if the key is absent.
    pub insert_joined: &'static str,
    /// Set `joined_at` only if it is still empty.
    pub open_window: &'static str,
    /// Insert a bare record, only if the key is absent.
    pub insert_stub: &'static str,
    /// Set `code` and `code_issued_at` only if `code` is still empty.
    pub set_code: &'static str,
    /// Insert a complete record, only if the key is absent.
    pub insert_full: &'static str,
}

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS promo_subscribers (
    user_id VARCHAR(32) NOT NULL PRIMARY KEY,
    display_name VARCHAR(255),
    code VARCHAR(64),
    code_issued_at VARCHAR(40),
    joined_at VARCHAR(40)
)
"#;

const QMARK_FIND: &str = r#"
SELECT user_id, display_name, code, code_issued_at, joined_at
FROM promo_subscribers
WHERE user_id = ?
"#;

const SQLITE_FIND: &str = r#"
SELECT user_id, display_name, code, code_issued_at, joined_at
FROM promo_subscribers
WHERE user_id = ?
ORDER BY rowid
"#;

const QMARK_LIST: &str = r#"
SELECT user_id, display_name, code, code_issued_at, joined_at
FROM promo_subscribers
"#;

const QMARK_OPEN_WINDOW: &str = r#"
UPDATE promo_subscribers
SET joined_at = ?, display_name = COALESCE(display_name, ?)
WHERE user_id = ? AND (joined_at IS NULL OR joined_at = '')
"#;

const QMARK_SET_CODE: &str = r#"
UPDATE promo_subscribers
SET code = ?, code_issued_at = ?
WHERE user_id = ? AND (code IS NULL OR code = '')
"#;

/// PostgreSQL statements.
pub static POSTGRES: Queries = Queries {
    create_table: CREATE_TABLE,
    find: r#"
SELECT user_id, display_name, code, code_issued_at, joined_at
FROM promo_subscribers
WHERE user_id = $1
"#,
    list: r#"
SELECT user_id, display_name, code, code_issued_at, joined_at
FROM promo_subscribers
"#,
    insert_joined: r#"
INSERT INTO promo_subscribers (user_id, display_name, joined_at)
VALUES ($1, $2, $3)
ON CONFLICT (user_id) DO NOTHING
"#,
    open_window: r#"
UPDATE promo_subscribers
SET joined_at = $1, display_name = COALESCE(display_name, $2)
WHERE user_id = $3 AND (joined_at IS NULL OR joined_at = '')
"#,
    insert_stub: r#"
INSERT INTO promo_subscribers (user_id, display_name)
VALUES ($1, $2)
ON CONFLICT (user_id) DO NOTHING
"#,
    set_code: r#"
UPDATE promo_subscribers
SET code = $1, code_issued_at = $2
WHERE user_id = $3 AND (code IS NULL OR code = '')
"#,
    insert_full: r#"
INSERT INTO promo_subscribers (user_id, display_name, code, code_issued_at, joined_at)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (user_id) DO NOTHING
"#,
};

/// SQLite statements.
pub static SQLITE: Queries = Queries {
    create_table: CREATE_TABLE,
    find: SQLITE_FIND,
    list: QMARK_LIST,
    insert_joined: r#"
INSERT INTO promo_subscribers (user_id, display_name, joined_at)
VALUES (?, ?, ?)
ON CONFLICT (user_id) DO NOTHING
"#,
    open_window: QMARK_OPEN_WINDOW,
    insert_stub: r#"
INSERT INTO promo_subscribers (user_id, display_name)
VALUES (?, ?)
ON CONFLICT (user_id) DO NOTHING
"#,
    set_code: QMARK_SET_CODE,
    insert_full: r#"
INSERT INTO promo_subscribers (user_id, display_name, code, code_issued_at, joined_at)
VALUES (?, ?, ?, ?, ?)
ON CONFLICT (user_id) DO NOTHING
"#,
};

/// MySQL/MariaDB statements.
pub static MYSQL: Queries = Queries {
    create_table: CREATE_TABLE,
    find: QMARK_FIND,
    list: QMARK_LIST,
    insert_joined: r#"
INSERT IGNORE INTO promo_subscribers (user_id, display_name, joined_at)
VALUES (?, ?, ?)
"#,
    open_window: QMARK_OPEN_WINDOW,
    insert_stub: r#"
INSERT IGNORE INTO promo_subscribers (user_id, display_name)
VALUES (?, ?)
"#,
    set_code: QMARK_SET_CODE,
    insert_full: r#"
INSERT IGNORE INTO promo_subscribers (user_id, display_name, code, code_issued_at, joined_at)
VALUES (?, ?, ?, ?, ?)
"#,
};
