//! PostBoard - post creation and capacity accounting
//!
//! Capacity is the classic check-then-act race: two performers claiming the
//! last slot must resolve to exactly one winner. `reserve_slot` checks and
//! increments under a single post entry guard, flipping the status to
//! completed in the same operation when the increment fills the post.

use crate::error::PostError;
use crate::post::{Post, PostStatus};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use engex_core::{Credits, EngagementKind, PostId, UserId};
use engex_ledger::{CreditLedger, CreditTransaction, RelatedEntity, TransactionKind};
use tracing::{debug, info};

/// Outcome of a successful capacity reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotReservation {
    pub post_id: PostId,
    /// 1-based index of the slot that was taken
    pub slot: u32,
    /// True when this reservation consumed the last slot
    pub filled_post: bool,
}

/// Manages post rows: atomic create-with-debit and conditional capacity
/// updates. `current_engagements` and `status` are mutated only here.
#[derive(Debug, Default)]
pub struct PostBoard {
    posts: DashMap<PostId, Post>,
}

impl PostBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a post, debiting the owner in the same logical unit.
    ///
    /// The spend is applied first; if the ledger rejects it no row is
    /// created. The insert itself cannot fail, so a recorded debit always
    /// has its post row. Returns the post together with the debit record
    /// so the caller can journal it.
    pub fn create_post(
        &self,
        ledger: &CreditLedger,
        owner_id: &UserId,
        kind: EngagementKind,
        max_engagements: u32,
        cost: Credits,
        ttl: Duration,
    ) -> Result<(Post, CreditTransaction), PostError> {
        if max_engagements == 0 {
            return Err(PostError::InvalidCapacity(max_engagements));
        }

        let id = PostId::generate();
        let now = Utc::now();

        let debit = ledger.apply_transaction(
            owner_id,
            -cost,
            TransactionKind::Spend,
            format!("post {} ({} x{})", id, kind, max_engagements),
            Some(RelatedEntity::Post(id)),
        )?;

        let post = Post {
            id,
            owner_id: owner_id.clone(),
            kind,
            cost,
            max_engagements,
            current_engagements: 0,
            status: PostStatus::Active,
            created_at: now,
            expires_at: now + ttl,
        };
        self.posts.insert(id, post.clone());

        info!(post = %id, owner = %owner_id, kind = %kind, cost = %cost, "post created");
        Ok((post, debit))
    }

    /// Atomically claim one engagement slot.
    ///
    /// A single conditional update under the post entry guard: increments
    /// `current_engagements` only while `current < max`, and flips the
    /// status to completed in the same operation when the increment reaches
    /// capacity. Exactly one of N concurrent callers wins the last slot;
    /// the rest get `PostFull`.
    pub fn reserve_slot(
        &self,
        post_id: &PostId,
        now: DateTime<Utc>,
    ) -> Result<SlotReservation, PostError> {
        let mut post = self
            .posts
            .get_mut(post_id)
            .ok_or(PostError::NotFound(*post_id))?;

        match post.status {
            PostStatus::Active => {}
            // Capacity exhausted reads as PostFull, not a status error
            PostStatus::Completed => return Err(PostError::PostFull(*post_id)),
            status => {
                return Err(PostError::NotActive {
                    id: *post_id,
                    status,
                })
            }
        }
        if post.expires_at <= now {
            return Err(PostError::Expired(*post_id));
        }
        if post.current_engagements >= post.max_engagements {
            return Err(PostError::PostFull(*post_id));
        }

        post.current_engagements += 1;
        let filled = post.current_engagements == post.max_engagements;
        if filled {
            post.status = PostStatus::Completed;
        }

        debug!(
            post = %post_id,
            slot = post.current_engagements,
            filled,
            "slot reserved"
        );

        Ok(SlotReservation {
            post_id: *post_id,
            slot: post.current_engagements,
            filled_post: filled,
        })
    }

    /// Owner moderation: suspend an active post
    pub fn pause(&self, post_id: &PostId) -> Result<(), PostError> {
        self.transition(post_id, PostStatus::Active, PostStatus::Paused)
    }

    /// Owner moderation: reopen a paused post
    pub fn resume(&self, post_id: &PostId) -> Result<(), PostError> {
        self.transition(post_id, PostStatus::Paused, PostStatus::Active)
    }

    fn transition(
        &self,
        post_id: &PostId,
        from: PostStatus,
        to: PostStatus,
    ) -> Result<(), PostError> {
        let mut post = self
            .posts
            .get_mut(post_id)
            .ok_or(PostError::NotFound(*post_id))?;
        if post.status != from {
            return Err(PostError::NotActive {
                id: *post_id,
                status: post.status,
            });
        }
        post.status = to;
        info!(post = %post_id, from = %from, to = %to, "post status changed");
        Ok(())
    }

    /// Reaper hook: flip active posts past their expiry to expired.
    ///
    /// Conditional on current status and timestamp, so it is safe to run
    /// concurrently with live traffic and with other sweeps.
    pub fn expire_due(&self, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for mut entry in self.posts.iter_mut() {
            if entry.status == PostStatus::Active && entry.expires_at <= now {
                entry.status = PostStatus::Expired;
                expired += 1;
            }
        }
        if expired > 0 {
            info!(count = expired, "expired due posts");
        }
        expired
    }

    pub fn get(&self, post_id: &PostId) -> Option<Post> {
        self.posts.get(post_id).map(|post| post.clone())
    }

    /// Active, non-expired posts, newest first, paginated.
    ///
    /// Filters lazily on `expires_at > now` so unswept posts never show.
    pub fn list_active(&self, now: DateTime<Utc>, offset: usize, limit: usize) -> Vec<Post> {
        let mut active: Vec<Post> = self
            .posts
            .iter()
            .filter(|entry| entry.is_open(now))
            .map(|entry| entry.clone())
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        active.into_iter().skip(offset).take(limit).collect()
    }

    pub fn post_count(&self) -> usize {
        self.posts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engex_core::Credits;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn funded_ledger(id: &str, amount: i64) -> CreditLedger {
        let ledger = CreditLedger::new();
        ledger
            .apply_transaction(
                &user(id),
                Credits::new(amount),
                TransactionKind::Bonus,
                "seed",
                None,
            )
            .unwrap();
        ledger
    }

    fn create(board: &PostBoard, ledger: &CreditLedger, owner: &str, max: u32, cost: i64) -> Post {
        let (post, _) = board
            .create_post(
                ledger,
                &user(owner),
                EngagementKind::Like,
                max,
                Credits::new(cost),
                Duration::days(7),
            )
            .unwrap();
        post
    }

    #[test]
    fn test_create_debits_owner() {
        let ledger = funded_ledger("owner", 100);
        let board = PostBoard::new();

        let (post, debit) = board
            .create_post(
                &ledger,
                &user("owner"),
                EngagementKind::Like,
                5,
                Credits::new(1),
                Duration::days(7),
            )
            .unwrap();

        assert_eq!(ledger.balance(&user("owner")), Credits::new(99));
        assert_eq!(post.current_engagements, 0);
        assert_eq!(post.status, PostStatus::Active);
        assert_eq!(debit.kind, TransactionKind::Spend);
        assert_eq!(debit.amount, Credits::new(-1));
        assert_eq!(debit.related, Some(RelatedEntity::Post(post.id)));
    }

    #[test]
    fn test_create_fails_without_credits() {
        let ledger = funded_ledger("owner", 3);
        let board = PostBoard::new();

        let result = board.create_post(
            &ledger,
            &user("owner"),
            EngagementKind::Follow,
            10,
            Credits::new(10),
            Duration::days(7),
        );

        assert!(matches!(result, Err(PostError::Ledger(_))));
        // No row created, nothing debited
        assert_eq!(board.post_count(), 0);
        assert_eq!(ledger.balance(&user("owner")), Credits::new(3));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let ledger = funded_ledger("owner", 100);
        let board = PostBoard::new();

        let result = board.create_post(
            &ledger,
            &user("owner"),
            EngagementKind::Like,
            0,
            Credits::new(1),
            Duration::days(7),
        );
        assert!(matches!(result, Err(PostError::InvalidCapacity(0))));
        // Validation failed before the debit
        assert_eq!(ledger.balance(&user("owner")), Credits::new(100));
    }

    #[test]
    fn test_reserve_until_full() {
        let ledger = funded_ledger("owner", 100);
        let board = PostBoard::new();
        let post = create(&board, &ledger, "owner", 2, 1);
        let now = Utc::now();

        let first = board.reserve_slot(&post.id, now).unwrap();
        assert_eq!(first.slot, 1);
        assert!(!first.filled_post);

        let second = board.reserve_slot(&post.id, now).unwrap();
        assert_eq!(second.slot, 2);
        assert!(second.filled_post);
        assert_eq!(board.get(&post.id).unwrap().status, PostStatus::Completed);

        let third = board.reserve_slot(&post.id, now);
        assert!(matches!(third, Err(PostError::PostFull(_))));
    }

    #[test]
    fn test_reserve_expired_rejected() {
        let ledger = funded_ledger("owner", 100);
        let board = PostBoard::new();
        let post = create(&board, &ledger, "owner", 2, 1);

        let later = Utc::now() + Duration::days(8);
        let result = board.reserve_slot(&post.id, later);
        assert!(matches!(result, Err(PostError::Expired(_))));
    }

    #[test]
    fn test_pause_resume() {
        let ledger = funded_ledger("owner", 100);
        let board = PostBoard::new();
        let post = create(&board, &ledger, "owner", 2, 1);
        let now = Utc::now();

        board.pause(&post.id).unwrap();
        assert!(matches!(
            board.reserve_slot(&post.id, now),
            Err(PostError::NotActive { .. })
        ));
        // Pausing twice is rejected
        assert!(board.pause(&post.id).is_err());

        board.resume(&post.id).unwrap();
        assert!(board.reserve_slot(&post.id, now).is_ok());
    }

    #[test]
    fn test_expire_due_is_conditional() {
        let ledger = funded_ledger("owner", 100);
        let board = PostBoard::new();
        let post = create(&board, &ledger, "owner", 2, 1);

        let later = Utc::now() + Duration::days(8);
        assert_eq!(board.expire_due(later), 1);
        assert_eq!(board.get(&post.id).unwrap().status, PostStatus::Expired);

        // Second sweep finds nothing to do
        assert_eq!(board.expire_due(later), 0);
    }

    #[test]
    fn test_list_active_filters_and_paginates() {
        let ledger = funded_ledger("owner", 100);
        let board = PostBoard::new();
        let now = Utc::now();

        let a = create(&board, &ledger, "owner", 2, 1);
        let b = create(&board, &ledger, "owner", 2, 1);
        let _c = create(&board, &ledger, "owner", 2, 1);
        board.pause(&a.id).unwrap();

        let listed = board.list_active(now, 0, 10);
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|p| p.id != a.id));

        let page = board.list_active(now, 1, 1);
        assert_eq!(page.len(), 1);

        // A full post disappears from the listing
        board.reserve_slot(&b.id, now).unwrap();
        board.reserve_slot(&b.id, now).unwrap();
        assert_eq!(board.list_active(now, 0, 10).len(), 1);
    }

    #[test]
    fn test_last_slot_race_single_winner() {
        use std::sync::Arc;
        use std::thread;

        let ledger = funded_ledger("owner", 100);
        let board = Arc::new(PostBoard::new());
        let post = create(&board, &ledger, "owner", 1, 1);
        let now = Utc::now();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let board = Arc::clone(&board);
            let post_id = post.id;
            handles.push(thread::spawn(move || board.reserve_slot(&post_id, now)));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(PostError::PostFull(_)))));

        let stored = board.get(&post.id).unwrap();
        assert_eq!(stored.current_engagements, 1);
        assert_eq!(stored.status, PostStatus::Completed);
    }
}
