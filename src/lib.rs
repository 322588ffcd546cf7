//! ledger-core - The storage and aggregation core of a personal finance app
//!
//! This library provides the non-UI heart of a personal finance
//! application: the entity model, derived-balance aggregation, full-text
//! search over entities, batch import with partial-failure semantics,
//! and snapshot persistence. Presentation and analysis are external
//! collaborators that talk to the `Ledger` facade.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, transactions, categories, etc.)
//! - `ledger`: Entity store, change events, journal, and the `Ledger` facade
//! - `balance`: Lazy invalidate-on-write balance aggregation
//! - `search`: Inverted token index with ranked search
//! - `import`: Batch import and validation pipeline
//! - `snapshot`: Persistence boundary and JSON snapshot store
//!
//! # Example
//!
//! ```rust
//! use ledger_core::models::{Account, AccountKind, Money};
//! use ledger_core::Ledger;
//!
//! let mut ledger = Ledger::new();
//! let id = ledger
//!     .add_account(Account::with_opening_balance(
//!         "Checking",
//!         AccountKind::Checking,
//!         Money::from_cents(100_000),
//!     ))
//!     .unwrap();
//! assert_eq!(ledger.current_balance(id).unwrap(), Money::from_cents(100_000));
//! ```

pub mod balance;
pub mod error;
pub mod import;
pub mod ledger;
pub mod models;
pub mod search;
pub mod snapshot;

pub use error::{LedgerError, LedgerResult};
pub use import::{ImportResult, RawRecord, RecordOutcome, Severity, ValidationError};
pub use ledger::{ChangeOp, DeletePolicy, EntityKind, Ledger};
pub use search::{MatchQuality, SearchFilter, SearchResult};
pub use snapshot::{JsonSnapshotStore, LedgerSnapshot, SnapshotStore};
