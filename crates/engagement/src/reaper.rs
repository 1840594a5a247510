//! ExpiryReaper - periodic sweep retiring expired posts and engagements
//!
//! Both sweeps are conditional updates keyed on the current row state, so a
//! sweep racing a live transition touches nothing it should not, and a
//! crashed or skipped run is harmless: the next sweep covers it.

use crate::lifecycle::EngagementLifecycle;
use chrono::{DateTime, Utc};
use engex_posts::PostBoard;
use std::sync::Arc;
use tracing::{debug, info};

/// What one sweep retired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    pub posts_expired: usize,
    pub engagements_expired: usize,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.posts_expired == 0 && self.engagements_expired == 0
    }
}

pub struct ExpiryReaper {
    board: Arc<PostBoard>,
    lifecycle: Arc<EngagementLifecycle>,
}

impl ExpiryReaper {
    pub fn new(board: Arc<PostBoard>, lifecycle: Arc<EngagementLifecycle>) -> Self {
        Self { board, lifecycle }
    }

    /// Run one sweep against the given clock
    pub fn sweep(&self, now: DateTime<Utc>) -> SweepReport {
        let report = SweepReport {
            posts_expired: self.board.expire_due(now),
            engagements_expired: self.lifecycle.expire_stuck(now),
        };

        if report.is_empty() {
            debug!("reaper sweep found nothing due");
        } else {
            info!(
                posts = report.posts_expired,
                engagements = report.engagements_expired,
                "reaper sweep"
            );
        }
        report
    }

    /// Sweep forever on a fixed period. Intended to be spawned as a
    /// background task alongside the server loop.
    pub async fn run(&self, period: std::time::Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            self.sweep(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngagementConfig;
    use crate::engagement::EngagementStatus;
    use chrono::Duration;
    use engex_core::{Credits, EngagementKind, UserId};
    use engex_ledger::{CreditLedger, TransactionKind};
    use engex_posts::PostStatus;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[test]
    fn test_sweep_expires_due_posts_and_engagements() {
        let config = EngagementConfig {
            post_ttl_days: 0,
            settlement_timeout_minutes: 0,
            ..Default::default()
        };
        let ledger = Arc::new(CreditLedger::new());
        let board = Arc::new(PostBoard::new());
        let lifecycle = Arc::new(EngagementLifecycle::new(
            config,
            Arc::clone(&ledger),
            Arc::clone(&board),
        ));

        ledger
            .apply_transaction(
                &user("owner"),
                Credits::new(100),
                TransactionKind::Bonus,
                "seed",
                None,
            )
            .unwrap();
        // Long-lived post carrying a stuck engagement, plus a zero-TTL post
        let (open, _) = board
            .create_post(
                &ledger,
                &user("owner"),
                EngagementKind::Like,
                5,
                Credits::new(5),
                Duration::days(7),
            )
            .unwrap();
        let (due, _) = board
            .create_post(
                &ledger,
                &user("owner"),
                EngagementKind::Like,
                5,
                Credits::new(5),
                Duration::zero(),
            )
            .unwrap();
        let stuck = lifecycle
            .create_engagement(open.id, &user("perf"), EngagementKind::Like)
            .unwrap();

        let reaper = ExpiryReaper::new(Arc::clone(&board), Arc::clone(&lifecycle));
        let report = reaper.sweep(Utc::now() + Duration::minutes(1));

        assert_eq!(report.posts_expired, 1);
        assert_eq!(report.engagements_expired, 1);
        assert_eq!(board.get(&due.id).unwrap().status, PostStatus::Expired);
        assert_eq!(board.get(&open.id).unwrap().status, PostStatus::Active);
        assert_eq!(
            lifecycle.get(&stuck.id).unwrap().status,
            EngagementStatus::Expired
        );

        // Second sweep finds nothing
        assert!(reaper.sweep(Utc::now() + Duration::minutes(2)).is_empty());
    }
}
