//! SQL database record store.
//!
//! This module provides the transactional-table backend for PostgreSQL, MySQL
//! and SQLite through the SQLx `Any` driver.
//!
//! # Features
//!
//! Enable one or more database features in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! promo-store = { version = "0.1", features = ["sql-postgres"] }
//! # or
//! promo-store = { version = "0.1", features = ["sql-mysql"] }
//! # or
//! promo-store = { version = "0.1", features = ["sql-sqlite"] }
//! ```
//!
//! # Database Schema
//!
//! [`SqlStore::init_schema`] creates the table below. All columns are text so
//! rows match the persisted layout used by sheets and exports.
//!
//! ```sql
//! CREATE TABLE promo_subscribers (
//!     user_id VARCHAR(32) NOT NULL PRIMARY KEY,
//!     display_name VARCHAR(255),
//!     code VARCHAR(64),             -- write-once
//!     code_issued_at VARCHAR(40),   -- RFC 3339, UTC
//!     joined_at VARCHAR(40)         -- write-once
//! );
//! ```

mod backend;
mod config;
mod queries;

#[cfg(all(test, feature = "sql-sqlite"))]
mod tests;

pub use backend::{DatabaseType, SqlStore};
pub use config::SqlStoreConfig;
