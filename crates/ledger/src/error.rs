//! Ledger errors

use crate::hash::ChainError;
use engex_core::{Credits, CreditsError};
use thiserror::Error;

/// Errors that can occur in ledger operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The transaction would push the balance below zero.
    /// Nothing is recorded; only admin adjustments bypass this rule.
    #[error("Insufficient credits: requested {requested}, available {available}")]
    InsufficientCredits {
        requested: Credits,
        available: Credits,
    },

    #[error("Transaction description cannot be empty")]
    EmptyDescription,

    #[error(transparent)]
    Arithmetic(#[from] CreditsError),

    #[error("Ledger integrity fault: {0}")]
    Integrity(#[from] ChainError),
}
