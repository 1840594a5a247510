//! Engagement - one performer's attempt to fulfill a post

use chrono::{DateTime, Utc};
use engex_core::{Credits, EngagementId, EngagementKind, PostId, UserId};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Engagement state machine status.
///
/// `pending -> in_progress -> completed | failed`; any non-terminal state
/// moves to `expired` once the settlement timeout passes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EngagementStatus {
    /// Claimed; waiting for the automation actor to pick it up
    Pending,
    /// Actor reported it started the real-world action
    InProgress,
    /// Settled; credits awarded exactly once
    Completed,
    /// Settled without credits; the performer may claim again
    Failed,
    /// Never settled before the timeout; retired by the reaper
    Expired,
}

impl EngagementStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Expired)
    }

    /// Whether a claim in this status blocks a new claim on the same
    /// (performer, post) pair. Only a failed claim frees the pair.
    pub fn blocks_reclaim(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Outcome reported by the automation actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EngagementOutcome {
    Success,
    Failure,
}

/// One tracked engagement attempt.
///
/// Only `status`, `retry_count`, `completed_at`, and `last_error` mutate
/// after creation, and only through `EngagementLifecycle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub id: EngagementId,
    pub post_id: PostId,
    pub performer_id: UserId,
    pub kind: EngagementKind,
    pub status: EngagementStatus,
    /// Credits awarded on successful settlement, fixed at claim time
    pub credits_earned: Credits,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Failures so far for this (performer, post) pair, carried across
    /// re-claims after a failure
    pub retry_count: u32,
    pub last_error: Option<String>,
}
