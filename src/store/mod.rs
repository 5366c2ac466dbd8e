//! Resumable account store.
//!
//! Persists fetch results keyed by `(handle, filter)` together with the
//! resume cursor and completion flag, in a single SQLite `accounts` table.
//!
//! - [`accounts`]: upsert, listing, direct CRUD
//! - [`backup`]: JSON/TXT export and JSON import
//! - [`migrations`]: versioned schema steps
//! - [`payload`]: payload shapes and the legacy normalizer

pub mod accounts;
pub mod backup;
pub mod migrations;
pub mod payload;

pub use accounts::{AccountRecord, AccountStore, AccountSummary, Group, SaveAccount, DEFAULT_FILTER};
pub use payload::{normalize_payload, resume_state, PayloadShape};
