//! Subscriber record stores for the promo engine.
//!
//! This crate defines the [`RecordStore`] contract the eligibility engine is
//! written against, the [`UserRecord`] data model, and the persisted layout
//! shared by all backends:
//!
//! - [`MemoryStore`] - in-process map, natively atomic
//! - [`SheetStore`] - spreadsheet-style file, per-user serialized writes
//! - [`sql::SqlStore`] - transactional table via SQLx (feature `sql`)
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use promo_store::{IssueOutcome, MemoryStore, PromoCode, RecordStore, UserId};
//!
//! # async fn example() -> Result<(), promo_store::StoreError> {
//! let store = MemoryStore::new();
//! let user = UserId(42);
//!
//! store.upsert_join(user, Some("alice"), Utc::now()).await?;
//! let code = PromoCode::new("PROMO-1F2E3D");
//! assert_eq!(store.issue_code(user, &code, Utc::now()).await?, IssueOutcome::Issued);
//! assert_eq!(store.issue_code(user, &code, Utc::now()).await?, IssueOutcome::AlreadyIssued);
//! # Ok(())
//! # }
//! ```

mod error;
mod keyed;
pub mod layout;
mod memory;
mod record;
mod sheet;
pub mod timestamp;
mod traits;

#[cfg(feature = "sql")]
pub mod sql;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::StoreError;
pub use keyed::KeyedLocks;
pub use memory::MemoryStore;
pub use record::{IssueOutcome, JoinOutcome, PromoCode, StoredTime, StubOutcome, UserId, UserRecord};
pub use sheet::SheetStore;
pub use traits::RecordStore;

#[cfg(feature = "cli")]
pub use cli::StoreArgs;
