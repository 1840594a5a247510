//! Engex Ledger - Credit accounting core
//!
//! This is the HEART of Engex. All credit balance changes go through this
//! crate.
//!
//! # Key Types
//! - `CreditTransaction`: Immutable, hash-chained ledger record
//! - `CreditLedger`: Sole writer of balances; append + cache in one unit
//! - `UserAccount`: Cached per-user projection (balance, totals)
//! - `DriftReport`: Reconciliation output; drift is reported, never healed

pub mod account;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod transaction;

pub use account::UserAccount;
pub use error::LedgerError;
pub use hash::{calculate_transaction_hash, verify_chain, ChainError};
pub use ledger::{CreditLedger, DriftReport};
pub use transaction::{CreditTransaction, RelatedEntity, TransactionKind, GENESIS_HASH};
