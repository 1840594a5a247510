//! Hash chain utilities for ledger integrity

use crate::transaction::{CreditTransaction, GENESIS_HASH};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Calculate SHA256 hash of record content (excluding the hash field itself)
pub fn calculate_transaction_hash(tx: &CreditTransaction) -> String {
    let mut hasher = Sha256::new();

    hasher.update(tx.id.as_bytes());
    hasher.update(tx.user_id.as_str().as_bytes());
    hasher.update(tx.kind.to_string().as_bytes());
    hasher.update(tx.amount.value().to_le_bytes());
    hasher.update(tx.resulting_balance.value().to_le_bytes());
    hasher.update(tx.description.as_bytes());
    hasher.update(tx.sequence.to_le_bytes());
    hasher.update(tx.prev_hash.as_bytes());
    hasher.update(tx.created_at.to_rfc3339().as_bytes());

    if let Some(ref related) = tx.related {
        hasher.update(format!("{:?}", related).as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// Errors in hash chain verification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Broken link at seq {sequence}: expected prev_hash '{expected}', got '{actual}'")]
    BrokenLink {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid hash at seq {sequence}: expected '{expected}', got '{actual}'")]
    InvalidHash {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Invalid sequence: expected {expected}, got {actual}")]
    InvalidSequence { expected: u64, actual: u64 },
}

/// Verify one user's hash chain.
///
/// Records must be in append order: sequence 1..n, each prev_hash linking to
/// the previous record's hash, each hash matching the record content.
pub fn verify_chain(records: &[CreditTransaction]) -> Result<(), ChainError> {
    let mut prev_hash = GENESIS_HASH.to_string();

    for (i, tx) in records.iter().enumerate() {
        let expected_seq = i as u64 + 1;
        if tx.sequence != expected_seq {
            return Err(ChainError::InvalidSequence {
                expected: expected_seq,
                actual: tx.sequence,
            });
        }

        if tx.prev_hash != prev_hash {
            return Err(ChainError::BrokenLink {
                sequence: tx.sequence,
                expected: prev_hash,
                actual: tx.prev_hash.clone(),
            });
        }

        let calculated = calculate_transaction_hash(tx);
        if tx.hash != calculated {
            return Err(ChainError::InvalidHash {
                sequence: tx.sequence,
                expected: calculated,
                actual: tx.hash.clone(),
            });
        }

        prev_hash = tx.hash.clone();
    }

    Ok(())
}
