//! Promo eligibility engine.
//!
//! Decides, for one user at one moment, whether a promotional code is due,
//! and issues it at most once. The pieces:
//!
//! - [`decide`] - pure decision over oracle status, record and time
//! - [`EligibilityEngine`] - runs decisions against a [`RecordStore`] and a
//!   [`SubscriptionOracle`], with timeouts on both
//! - [`CodeGenerator`] - `PREFIX-XXXXXX` codes from the OS random source
//! - [`MembershipEvent`] - join transitions that open the eligibility window
//!
//! [`RecordStore`]: promo_store::RecordStore

mod code;
mod engine;
mod error;
mod membership;
mod oracle;
mod outcome;
mod state;
mod status;

pub use code::CodeGenerator;
pub use engine::{EligibilityEngine, EngineConfig};
pub use error::{EngineError, OracleError};
pub use membership::{MembershipAction, MembershipEvent};
pub use oracle::{StaticOracle, SubscriptionOracle};
pub use outcome::{Greeting, Outcome};
pub use state::{Decision, EligibilityState, NewUserPolicy, decide};
pub use status::MembershipStatus;
