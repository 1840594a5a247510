//! Post - a standing, paid request for engagements

use chrono::{DateTime, Utc};
use engex_core::{Credits, EngagementKind, PostId, UserId};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Post lifecycle status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Accepting engagements
    Active,
    /// Capacity exhausted
    Completed,
    /// Past expires_at (lazy or swept)
    Expired,
    /// Owner-suspended; can be resumed
    Paused,
}

/// A standing request, paid in credits, for up to `max_engagements`
/// engagements of one kind.
///
/// # Invariants
/// - `0 <= current_engagements <= max_engagements`
/// - `current_engagements == max_engagements` implies `Completed`
///
/// Only `current_engagements` and `status` mutate after creation, and only
/// through `PostBoard`'s conditional updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub owner_id: UserId,
    pub kind: EngagementKind,
    /// Credits debited from the owner at creation
    pub cost: Credits,
    pub max_engagements: u32,
    pub current_engagements: u32,
    pub status: PostStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Post {
    /// Whether the post can accept a new engagement at `now`.
    ///
    /// Expiry is checked lazily here; the reaper flips the stored status.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Active && self.expires_at > now
    }

    pub fn remaining_slots(&self) -> u32 {
        self.max_engagements.saturating_sub(self.current_engagements)
    }
}
