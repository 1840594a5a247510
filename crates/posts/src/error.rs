//! Post board errors

use crate::post::PostStatus;
use engex_core::PostId;
use engex_ledger::LedgerError;
use thiserror::Error;

/// Errors that can occur in post operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostError {
    #[error("Post not found: {0}")]
    NotFound(PostId),

    /// Legitimate race outcome: another performer took the last slot.
    /// Callers should try a different post, not retry this one.
    #[error("Post {0} has no remaining engagement slots")]
    PostFull(PostId),

    #[error("Post {id} is {status}, not active")]
    NotActive { id: PostId, status: PostStatus },

    #[error("Post {0} is past its expiry")]
    Expired(PostId),

    #[error("Post capacity must be at least 1, got {0}")]
    InvalidCapacity(u32),

    #[error("Ledger rejected the post debit: {0}")]
    Ledger(#[from] LedgerError),
}
