//! Credit transactions - the append-only record of every balance change
//!
//! A `CreditTransaction` is written exactly once by
//! `CreditLedger::apply_transaction` and never mutated or deleted afterward.
//! Each user's records form a hash chain (prev_hash -> hash) with a strictly
//! increasing per-user sequence.

use chrono::{DateTime, Utc};
use engex_core::{Credits, EngagementId, PostId, UserId};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Prev-hash sentinel for the first record of a user's chain
pub const GENESIS_HASH: &str = "GENESIS";

/// Why a balance changed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Credits earned by completing an engagement
    Earn,
    /// Credits spent publishing a post
    Spend,
    /// Promotional or referral bonus
    Bonus,
    /// Credits returned for a post that could not be served
    Refund,
    /// Operator correction; the only kind allowed to push a balance below zero
    AdminAdjustment,
}

/// The entity a transaction settles against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum RelatedEntity {
    Post(PostId),
    Engagement(EngagementId),
}

/// One immutable ledger record.
///
/// `resulting_balance` is the user's cached balance immediately after this
/// record was applied; replaying the full chain must reproduce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: TransactionKind,
    /// Signed amount: positive for earn/bonus/refund, negative for spend
    pub amount: Credits,
    pub resulting_balance: Credits,
    pub description: String,
    pub related: Option<RelatedEntity>,
    /// Per-user sequence, starting at 1
    pub sequence: u64,
    pub prev_hash: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}
