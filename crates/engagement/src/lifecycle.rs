//! EngagementLifecycle - validation, capacity reservation, settlement
//!
//! Coordinates the full life of an engagement: claim (validate + reserve a
//! capacity slot + insert pending), progress, and settlement through the
//! credit ledger. The claims index is the storage-level uniqueness
//! constraint for the one-active-claim-per-(performer, post) invariant; the
//! application-level pre-check alone would leave a race between concurrent
//! requests from the same user.

use crate::config::EngagementConfig;
use crate::daily_cap::DailyCapTracker;
use crate::engagement::{Engagement, EngagementOutcome, EngagementStatus};
use crate::error::{EngagementError, ValidationError};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use engex_core::{EngagementId, EngagementKind, PostId, UserId};
use engex_ledger::{CreditLedger, CreditTransaction, RelatedEntity, TransactionKind};
use engex_posts::{PostBoard, PostStatus};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a settlement call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Credits were awarded; carries the ledger record for journaling
    Completed { transaction: CreditTransaction },
    /// No credits; the pair may re-claim while retries remain
    Failed { retry_count: u32 },
    /// The engagement was already terminal; nothing was done.
    /// This is what makes double callbacks credit at most once.
    AlreadySettled,
}

/// The engagement state machine and its indexes.
///
/// `claims` maps each (post, performer) pair to its latest engagement and
/// its entry guard is held across validate + reserve + insert, so a claim
/// either fully exists or never happened.
pub struct EngagementLifecycle {
    config: EngagementConfig,
    ledger: Arc<CreditLedger>,
    board: Arc<PostBoard>,
    cap: DailyCapTracker,
    engagements: DashMap<EngagementId, Engagement>,
    claims: DashMap<(PostId, UserId), EngagementId>,
    by_user: DashMap<UserId, Vec<EngagementId>>,
    by_post: DashMap<PostId, Vec<EngagementId>>,
}

impl EngagementLifecycle {
    pub fn new(config: EngagementConfig, ledger: Arc<CreditLedger>, board: Arc<PostBoard>) -> Self {
        Self {
            config,
            ledger,
            board,
            cap: DailyCapTracker,
            engagements: DashMap::new(),
            claims: DashMap::new(),
            by_user: DashMap::new(),
            by_post: DashMap::new(),
        }
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    pub fn board(&self) -> &Arc<PostBoard> {
        &self.board
    }

    pub fn ledger(&self) -> &Arc<CreditLedger> {
        &self.ledger
    }

    /// Claim an engagement slot on a post.
    ///
    /// Validates, in order: post exists and is open; performer is not the
    /// owner; kind matches; no blocking prior claim for the pair; daily cap
    /// not reached. Then reserves capacity - losing that race yields
    /// `PostFull` even though every earlier check passed, which is an
    /// expected outcome, not a bug. On success the pending row is inserted
    /// while the claims entry guard is still held.
    pub fn create_engagement(
        &self,
        post_id: PostId,
        performer_id: &UserId,
        kind: EngagementKind,
    ) -> Result<Engagement, EngagementError> {
        let now = Utc::now();

        let post = self
            .board
            .get(&post_id)
            .ok_or(ValidationError::PostNotFound(post_id))?;
        match post.status {
            PostStatus::Active => {}
            PostStatus::Completed => return Err(EngagementError::PostFull(post_id)),
            status => {
                return Err(ValidationError::PostInactive {
                    id: post_id,
                    status,
                }
                .into())
            }
        }
        if post.expires_at <= now {
            return Err(ValidationError::PostExpired(post_id).into());
        }
        if post.owner_id == *performer_id {
            return Err(ValidationError::SelfEngagement.into());
        }
        if kind != post.kind {
            return Err(ValidationError::KindMismatch {
                requested: kind,
                expected: post.kind,
            }
            .into());
        }

        // Serialize concurrent claims for the same pair on the claims entry
        let claim_entry = self.claims.entry((post_id, performer_id.clone()));
        let retry_count = match &claim_entry {
            Entry::Occupied(occupied) => {
                let prior_id = *occupied.get();
                let prior = self
                    .engagements
                    .get(&prior_id)
                    .map(|e| (e.status, e.retry_count));
                match prior {
                    Some((status, _)) if status.blocks_reclaim() => {
                        return Err(ValidationError::DuplicateClaim {
                            post: post_id,
                            engagement: prior_id,
                        }
                        .into());
                    }
                    Some((_, retries)) if retries >= self.config.max_retries => {
                        return Err(ValidationError::RetriesExhausted {
                            post: post_id,
                            retry_count: retries,
                        }
                        .into());
                    }
                    Some((_, retries)) => retries,
                    None => 0,
                }
            }
            Entry::Vacant(_) => 0,
        };

        let count = self.cap.count_today(
            self.user_engagements(performer_id).iter(),
            now,
        );
        if count >= self.config.daily_cap {
            return Err(ValidationError::DailyCapReached {
                count,
                cap: self.config.daily_cap,
            }
            .into());
        }

        let reservation = self
            .board
            .reserve_slot(&post_id, now)
            .map_err(|e| EngagementError::from_reserve(post_id, e))?;

        let engagement = Engagement {
            id: EngagementId::generate(),
            post_id,
            performer_id: performer_id.clone(),
            kind,
            status: EngagementStatus::Pending,
            credits_earned: self.config.reward_per_engagement,
            created_at: now,
            completed_at: None,
            retry_count,
            last_error: None,
        };

        self.engagements.insert(engagement.id, engagement.clone());
        claim_entry.insert(engagement.id);
        self.by_user
            .entry(performer_id.clone())
            .or_default()
            .push(engagement.id);
        self.by_post.entry(post_id).or_default().push(engagement.id);

        info!(
            engagement = %engagement.id,
            post = %post_id,
            performer = %performer_id,
            slot = reservation.slot,
            filled = reservation.filled_post,
            "engagement claimed"
        );
        Ok(engagement)
    }

    /// Actor picked up a pending engagement. Idempotent when already in
    /// progress; terminal engagements are rejected.
    pub fn mark_in_progress(&self, id: &EngagementId) -> Result<(), EngagementError> {
        let mut engagement = self
            .engagements
            .get_mut(id)
            .ok_or(EngagementError::NotFound(*id))?;

        match engagement.status {
            EngagementStatus::Pending => {
                engagement.status = EngagementStatus::InProgress;
                debug!(engagement = %id, "engagement in progress");
                Ok(())
            }
            EngagementStatus::InProgress => Ok(()),
            from => Err(EngagementError::InvalidTransition { id: *id, from }),
        }
    }

    /// Settle an engagement from the actor's reported outcome.
    ///
    /// Conditional transition: fires only from pending/in_progress, so the
    /// credit award happens at most once however many callbacks arrive.
    /// The credit and the status flip commit under one engagement guard.
    /// A failed outcome does not release the consumed capacity slot.
    pub fn complete_engagement(
        &self,
        id: &EngagementId,
        outcome: EngagementOutcome,
        error_message: Option<String>,
    ) -> Result<SettlementOutcome, EngagementError> {
        let now = Utc::now();
        let mut engagement = self
            .engagements
            .get_mut(id)
            .ok_or(EngagementError::NotFound(*id))?;

        if engagement.status.is_terminal() {
            debug!(engagement = %id, status = %engagement.status, "settlement no-op");
            return Ok(SettlementOutcome::AlreadySettled);
        }

        match outcome {
            EngagementOutcome::Success => {
                let transaction = self.ledger.apply_transaction(
                    &engagement.performer_id,
                    engagement.credits_earned,
                    TransactionKind::Earn,
                    format!("{} on post {}", engagement.kind, engagement.post_id),
                    Some(RelatedEntity::Engagement(*id)),
                )?;
                engagement.status = EngagementStatus::Completed;
                engagement.completed_at = Some(now);

                info!(
                    engagement = %id,
                    performer = %engagement.performer_id,
                    credited = %engagement.credits_earned,
                    "engagement completed"
                );
                Ok(SettlementOutcome::Completed { transaction })
            }
            EngagementOutcome::Failure => {
                engagement.status = EngagementStatus::Failed;
                engagement.retry_count += 1;
                engagement.completed_at = Some(now);
                engagement.last_error = error_message;

                warn!(
                    engagement = %id,
                    retry_count = engagement.retry_count,
                    error = engagement.last_error.as_deref().unwrap_or("unspecified"),
                    "engagement failed"
                );
                Ok(SettlementOutcome::Failed {
                    retry_count: engagement.retry_count,
                })
            }
        }
    }

    /// Reaper hook: retire engagements stuck past the settlement timeout.
    ///
    /// Conditional on current status and creation time; safe to run
    /// concurrently with live settlement.
    pub fn expire_stuck(&self, now: DateTime<Utc>) -> usize {
        let timeout = self.config.settlement_timeout();
        let mut expired = 0;

        for mut entry in self.engagements.iter_mut() {
            if !entry.status.is_terminal() && entry.created_at + timeout <= now {
                entry.status = EngagementStatus::Expired;
                entry.completed_at = Some(now);
                expired += 1;
            }
        }

        if expired > 0 {
            info!(count = expired, "expired stuck engagements");
        }
        expired
    }

    pub fn get(&self, id: &EngagementId) -> Option<Engagement> {
        self.engagements.get(id).map(|e| e.clone())
    }

    /// A user's engagements, oldest first, optionally filtered by status
    pub fn list_for_user(
        &self,
        user_id: &UserId,
        status: Option<EngagementStatus>,
    ) -> Vec<Engagement> {
        let mut engagements = self.user_engagements(user_id);
        if let Some(status) = status {
            engagements.retain(|e| e.status == status);
        }
        engagements
    }

    /// All engagements claimed against a post, oldest first
    pub fn list_for_post(&self, post_id: &PostId) -> Vec<Engagement> {
        self.by_post
            .get(post_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.engagements.get(id).map(|e| e.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn engagement_count(&self) -> usize {
        self.engagements.len()
    }

    fn user_engagements(&self, user_id: &UserId) -> Vec<Engagement> {
        self.by_user
            .get(user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.engagements.get(id).map(|e| e.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
