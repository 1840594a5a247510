//! Application context - wires everything together

use chrono::Utc;
use engex_core::{Credits, EngagementId, EngagementKind, PostId, UserId};
use engex_engagement::{
    Engagement, EngagementConfig, EngagementError, EngagementLifecycle, EngagementOutcome,
    EngagementStatus, ExpiryReaper, SettlementOutcome, SweepReport,
};
use engex_journal::{JournalError, JournalReader, JournalStore};
use engex_ledger::{
    ChainError, CreditLedger, CreditTransaction, DriftReport, LedgerError, RelatedEntity,
    TransactionKind,
};
use engex_posts::{Post, PostBoard, PostError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Errors surfaced by context operations
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Post error: {0}")]
    Post(#[from] PostError),

    #[error("Engagement error: {0}")]
    Engagement(#[from] EngagementError),

    #[error("Journal error: {0}")]
    Journal(#[from] JournalError),

    #[error("Post cost overflows: {0}")]
    Cost(#[from] engex_core::CreditsError),
}

/// Application context - wires together all components.
///
/// The journal is the durable record; the ledger, board, and lifecycle are
/// in-memory state. On startup the credit ledger is rebuilt by replaying
/// the journal; every committed transaction is appended before the call
/// returns.
pub struct AppContext {
    ledger: Arc<CreditLedger>,
    board: Arc<PostBoard>,
    lifecycle: Arc<EngagementLifecycle>,
    reaper: ExpiryReaper,
    journal: JournalStore,
    journal_path: PathBuf,
    replayed: usize,
}

impl AppContext {
    /// Create a new application context, replaying any existing journal
    pub fn new(data_path: impl AsRef<Path>, config: EngagementConfig) -> Result<Self, ContextError> {
        let journal_path = data_path.as_ref().join("journal");
        std::fs::create_dir_all(&journal_path).map_err(JournalError::from)?;

        // Replay the journal to rebuild ledger state
        let reader = JournalReader::from_directory(&journal_path)?;
        let records = reader.read_all()?;
        let replayed = records.len();

        let ledger = Arc::new(CreditLedger::from_records(records));
        let board = Arc::new(PostBoard::new());
        let lifecycle = Arc::new(EngagementLifecycle::new(
            config,
            Arc::clone(&ledger),
            Arc::clone(&board),
        ));
        let reaper = ExpiryReaper::new(Arc::clone(&board), Arc::clone(&lifecycle));
        let journal = JournalStore::new(&journal_path)?;

        if replayed > 0 {
            info!(records = replayed, "replayed journal");
        }

        Ok(Self {
            ledger,
            board,
            lifecycle,
            reaper,
            journal,
            journal_path,
            replayed,
        })
    }

    /// Grant promotional credits to a user
    pub fn grant(
        &mut self,
        user_id: &UserId,
        amount: Credits,
        description: &str,
    ) -> Result<CreditTransaction, ContextError> {
        let tx = self.ledger.apply_transaction(
            user_id,
            amount,
            TransactionKind::Bonus,
            description,
            None,
        )?;
        self.journal.append(&tx)?;
        Ok(tx)
    }

    /// Operator correction; the only path that may push a balance negative
    pub fn adjust(
        &mut self,
        user_id: &UserId,
        amount: Credits,
        description: &str,
    ) -> Result<CreditTransaction, ContextError> {
        let tx = self.ledger.apply_transaction(
            user_id,
            amount,
            TransactionKind::AdminAdjustment,
            description,
            None,
        )?;
        self.journal.append(&tx)?;
        Ok(tx)
    }

    /// Return credits to a user for a post that could not be served
    pub fn refund(
        &mut self,
        user_id: &UserId,
        amount: Credits,
        post_id: Option<PostId>,
        description: &str,
    ) -> Result<CreditTransaction, ContextError> {
        let tx = self.ledger.apply_transaction(
            user_id,
            amount,
            TransactionKind::Refund,
            description,
            post_id.map(RelatedEntity::Post),
        )?;
        self.journal.append(&tx)?;
        Ok(tx)
    }

    /// Publish a post, debiting the owner fee x max_engagements
    pub fn create_post(
        &mut self,
        owner_id: &UserId,
        kind: EngagementKind,
        max_engagements: u32,
    ) -> Result<Post, ContextError> {
        let cost = self.lifecycle.config().post_cost(max_engagements)?;
        let ttl = self.lifecycle.config().post_ttl();

        let (post, debit) =
            self.board
                .create_post(&self.ledger, owner_id, kind, max_engagements, cost, ttl)?;
        self.journal.append(&debit)?;
        Ok(post)
    }

    pub fn pause_post(&self, post_id: &PostId) -> Result<(), ContextError> {
        Ok(self.board.pause(post_id)?)
    }

    pub fn resume_post(&self, post_id: &PostId) -> Result<(), ContextError> {
        Ok(self.board.resume(post_id)?)
    }

    /// Claim an engagement slot on a post
    pub fn claim(
        &self,
        post_id: PostId,
        performer_id: &UserId,
        kind: EngagementKind,
    ) -> Result<Engagement, ContextError> {
        Ok(self.lifecycle.create_engagement(post_id, performer_id, kind)?)
    }

    pub fn start(&self, engagement_id: &EngagementId) -> Result<(), ContextError> {
        Ok(self.lifecycle.mark_in_progress(engagement_id)?)
    }

    /// Settle an engagement; a successful settlement is journaled
    pub fn settle(
        &mut self,
        engagement_id: &EngagementId,
        outcome: EngagementOutcome,
        error_message: Option<String>,
    ) -> Result<SettlementOutcome, ContextError> {
        let settled = self
            .lifecycle
            .complete_engagement(engagement_id, outcome, error_message)?;
        if let SettlementOutcome::Completed { ref transaction } = settled {
            self.journal.append(transaction)?;
        }
        Ok(settled)
    }

    /// One reaper sweep against the current clock
    pub fn sweep(&self) -> SweepReport {
        self.reaper.sweep(Utc::now())
    }

    /// Sweep on a fixed period until the task is cancelled
    pub async fn run_reaper(&self, period: std::time::Duration) {
        self.reaper.run(period).await;
    }

    // === Read surface ===

    pub fn balance(&self, user_id: &UserId) -> Credits {
        self.ledger.balance(user_id)
    }

    pub fn history(&self, user_id: &UserId) -> Vec<CreditTransaction> {
        self.ledger.history(user_id)
    }

    pub fn active_posts(&self, offset: usize, limit: usize) -> Vec<Post> {
        self.board.list_active(Utc::now(), offset, limit)
    }

    pub fn post(&self, post_id: &PostId) -> Option<Post> {
        self.board.get(post_id)
    }

    pub fn engagement(&self, engagement_id: &EngagementId) -> Option<Engagement> {
        self.lifecycle.get(engagement_id)
    }

    pub fn engagements_for(
        &self,
        user_id: &UserId,
        status: Option<EngagementStatus>,
    ) -> Vec<Engagement> {
        self.lifecycle.list_for_user(user_id, status)
    }

    pub fn engagements_on(&self, post_id: &PostId) -> Vec<Engagement> {
        self.lifecycle.list_for_post(post_id)
    }

    /// Recompute one user's balance from their records; never auto-heals
    pub fn reconcile(&self, user_id: &UserId) -> DriftReport {
        self.ledger.reconcile(user_id)
    }

    pub fn reconcile_all(&self) -> Vec<DriftReport> {
        self.ledger.reconcile_all()
    }

    /// Verify every user's hash chain
    pub fn audit(&self) -> Result<usize, (UserId, ChainError)> {
        let mut verified = 0;
        for user_id in self.ledger.user_ids() {
            self.ledger
                .verify_user_chain(&user_id)
                .map_err(|e| (user_id.clone(), e))?;
            verified += 1;
        }
        Ok(verified)
    }

    pub fn journal_path(&self) -> &Path {
        &self.journal_path
    }

    /// Records replayed from the journal at startup
    pub fn replayed(&self) -> usize {
        self.replayed
    }

    pub fn account_count(&self) -> usize {
        self.ledger.account_count()
    }

    /// Flush the journal; called automatically on drop
    pub fn close(&mut self) -> Result<(), ContextError> {
        Ok(self.journal.close()?)
    }
}
