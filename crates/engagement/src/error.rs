//! Engagement errors

use crate::engagement::EngagementStatus;
use engex_core::{EngagementId, EngagementKind, PostId};
use engex_ledger::LedgerError;
use engex_posts::{PostError, PostStatus};
use thiserror::Error;

/// Synchronous validation rejections.
///
/// None of these change any state; they are safe to show to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Post {id} is {status}, not accepting engagements")]
    PostInactive { id: PostId, status: PostStatus },

    #[error("Post {0} is past its expiry")]
    PostExpired(PostId),

    #[error("Cannot engage with your own post")]
    SelfEngagement,

    #[error("Engagement kind {requested} does not match post kind {expected}")]
    KindMismatch {
        requested: EngagementKind,
        expected: EngagementKind,
    },

    #[error("An engagement for this post already exists: {engagement}")]
    DuplicateClaim {
        post: PostId,
        engagement: EngagementId,
    },

    #[error("Post {post} failed {retry_count} times; no further attempts allowed")]
    RetriesExhausted { post: PostId, retry_count: u32 },

    #[error("Daily engagement cap reached: {count} of {cap}")]
    DailyCapReached { count: usize, cap: usize },
}

/// Errors from lifecycle operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngagementError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Legitimate race outcome: the capacity check passed but another
    /// performer took the slot first. Try a different post.
    #[error("Post {0} has no remaining engagement slots")]
    PostFull(PostId),

    #[error("Engagement not found: {0}")]
    NotFound(EngagementId),

    #[error("Engagement {id} cannot transition from {from}")]
    InvalidTransition {
        id: EngagementId,
        from: EngagementStatus,
    },

    #[error("Ledger rejected the settlement: {0}")]
    Ledger(#[from] LedgerError),
}

impl EngagementError {
    /// Map a capacity-reservation failure onto the lifecycle taxonomy
    pub(crate) fn from_reserve(post_id: PostId, err: PostError) -> Self {
        match err {
            PostError::PostFull(_) => EngagementError::PostFull(post_id),
            PostError::NotActive { status, .. } => ValidationError::PostInactive {
                id: post_id,
                status,
            }
            .into(),
            PostError::Expired(_) => ValidationError::PostExpired(post_id).into(),
            // reserve_slot raises nothing else
            _ => ValidationError::PostNotFound(post_id).into(),
        }
    }
}
