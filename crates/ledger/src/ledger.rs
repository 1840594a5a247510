//! CreditLedger - sole writer of balances
//!
//! All balance changes go through `apply_transaction`. The balance write and
//! the record append happen under a single account entry guard, so no
//! observer can see one without the other. Per-user records form a hash chain
//! for tamper evidence.

use crate::account::UserAccount;
use crate::error::LedgerError;
use crate::hash::{calculate_transaction_hash, verify_chain, ChainError};
use crate::transaction::{CreditTransaction, RelatedEntity, TransactionKind};
use chrono::Utc;
use dashmap::DashMap;
use engex_core::{Credits, UserId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Result of recomputing one user's balance from the log.
///
/// Drift is reported, never auto-corrected; a silent "fix" would mask the
/// bug that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftReport {
    pub user_id: UserId,
    pub cached: Credits,
    pub computed: Credits,
}

impl DriftReport {
    pub fn is_consistent(&self) -> bool {
        self.cached == self.computed
    }

    pub fn drift(&self) -> Credits {
        Credits::new(self.cached.value() - self.computed.value())
    }
}

/// Append-only transaction log plus cached per-user balances.
///
/// Accounts are serialized per user via the map's entry guard; unrelated
/// users never contend.
#[derive(Debug, Default)]
pub struct CreditLedger {
    accounts: DashMap<UserId, UserAccount>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from previously committed records, in append order.
    ///
    /// Used on startup to replay the journal. Records are trusted (they were
    /// validated when first committed); the chain can be re-verified with
    /// `verify_user_chain`.
    pub fn from_records(records: impl IntoIterator<Item = CreditTransaction>) -> Self {
        let ledger = Self::new();
        for tx in records {
            let mut account = ledger
                .accounts
                .entry(tx.user_id.clone())
                .or_insert_with(|| UserAccount::new(tx.user_id.clone()));
            account.absorb(tx);
        }
        ledger
    }

    /// Atomically apply one transaction to a user's account.
    ///
    /// Reads the current balance, computes the new one, rejects
    /// `InsufficientCredits` when it would go negative (admin adjustments are
    /// the only bypass), then writes the balance and appends the record as
    /// one indivisible unit under the account entry guard.
    pub fn apply_transaction(
        &self,
        user_id: &UserId,
        amount: Credits,
        kind: TransactionKind,
        description: impl Into<String>,
        related: Option<RelatedEntity>,
    ) -> Result<CreditTransaction, LedgerError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(LedgerError::EmptyDescription);
        }

        let mut account = self
            .accounts
            .entry(user_id.clone())
            .or_insert_with(|| UserAccount::new(user_id.clone()));

        let new_balance = account.balance.checked_add(amount)?;
        if new_balance.is_negative() && kind != TransactionKind::AdminAdjustment {
            return Err(LedgerError::InsufficientCredits {
                requested: amount.abs(),
                available: account.balance,
            });
        }

        let mut tx = CreditTransaction {
            id: Uuid::new_v4(),
            user_id: user_id.clone(),
            kind,
            amount,
            resulting_balance: new_balance,
            description,
            related,
            sequence: account.next_sequence(),
            prev_hash: account.last_hash(),
            hash: String::new(),
            created_at: Utc::now(),
        };
        tx.hash = calculate_transaction_hash(&tx);

        account.absorb(tx.clone());

        debug!(
            user = %user_id,
            kind = %kind,
            amount = %amount,
            balance = %new_balance,
            "ledger transaction applied"
        );

        Ok(tx)
    }

    /// Cached balance; zero for users the ledger has never seen
    pub fn balance(&self, user_id: &UserId) -> Credits {
        self.accounts
            .get(user_id)
            .map(|account| account.balance)
            .unwrap_or(Credits::ZERO)
    }

    /// Snapshot of a user's account (balance, totals, last activity)
    pub fn account(&self, user_id: &UserId) -> Option<UserAccount> {
        self.accounts.get(user_id).map(|account| account.clone())
    }

    /// Full transaction history for a user, oldest first
    pub fn history(&self, user_id: &UserId) -> Vec<CreditTransaction> {
        self.accounts
            .get(user_id)
            .map(|account| account.transactions().to_vec())
            .unwrap_or_default()
    }

    /// Recompute one user's balance from the log and compare to the cache.
    ///
    /// Runs under the account entry guard, so it only ever sees fully
    /// committed records and never raises false drift for in-flight applies.
    pub fn reconcile(&self, user_id: &UserId) -> DriftReport {
        let report = match self.accounts.get(user_id) {
            Some(account) => DriftReport {
                user_id: user_id.clone(),
                cached: account.balance,
                computed: account.recomputed_balance(),
            },
            None => DriftReport {
                user_id: user_id.clone(),
                cached: Credits::ZERO,
                computed: Credits::ZERO,
            },
        };

        if !report.is_consistent() {
            warn!(
                user = %report.user_id,
                cached = %report.cached,
                computed = %report.computed,
                "balance drift detected"
            );
        }

        report
    }

    /// Reconcile every known account; callers filter for inconsistencies
    pub fn reconcile_all(&self) -> Vec<DriftReport> {
        let users: Vec<UserId> = self
            .accounts
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        users.iter().map(|user| self.reconcile(user)).collect()
    }

    /// Verify the hash chain of one user's records
    pub fn verify_user_chain(&self, user_id: &UserId) -> Result<(), ChainError> {
        match self.accounts.get(user_id) {
            Some(account) => verify_chain(account.transactions()),
            None => Ok(()),
        }
    }

    /// All user ids known to the ledger
    pub fn user_ids(&self) -> Vec<UserId> {
        self.accounts
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// All records across all users, ordered by timestamp.
    ///
    /// Used when persisting a full snapshot; the journal normally records
    /// transactions as they commit.
    pub fn all_transactions(&self) -> Vec<CreditTransaction> {
        let mut all: Vec<CreditTransaction> = self
            .accounts
            .iter()
            .flat_map(|entry| entry.transactions().to_vec())
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn ledger_with_balance(id: &str, amount: i64) -> CreditLedger {
        let ledger = CreditLedger::new();
        ledger
            .apply_transaction(
                &user(id),
                Credits::new(amount),
                TransactionKind::Bonus,
                "signup bonus",
                None,
            )
            .unwrap();
        ledger
    }

    #[test]
    fn test_apply_and_balance() {
        let ledger = ledger_with_balance("alice", 100);
        assert_eq!(ledger.balance(&user("alice")), Credits::new(100));
        assert_eq!(ledger.balance(&user("nobody")), Credits::ZERO);
    }

    #[test]
    fn test_insufficient_credits_rejected() {
        let ledger = ledger_with_balance("alice", 5);

        let result = ledger.apply_transaction(
            &user("alice"),
            Credits::new(-10),
            TransactionKind::Spend,
            "post fee",
            None,
        );
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientCredits { .. })
        ));

        // Nothing recorded, balance unchanged
        assert_eq!(ledger.balance(&user("alice")), Credits::new(5));
        assert_eq!(ledger.history(&user("alice")).len(), 1);
    }

    #[test]
    fn test_admin_adjustment_bypasses_floor() {
        let ledger = ledger_with_balance("alice", 5);

        let tx = ledger
            .apply_transaction(
                &user("alice"),
                Credits::new(-1000),
                TransactionKind::AdminAdjustment,
                "fraud clawback",
                None,
            )
            .unwrap();

        assert_eq!(tx.resulting_balance, Credits::new(-995));
        assert_eq!(ledger.balance(&user("alice")), Credits::new(-995));

        // A regular spend on the negative balance is still rejected
        let result = ledger.apply_transaction(
            &user("alice"),
            Credits::new(-10),
            TransactionKind::Spend,
            "post fee",
            None,
        );
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientCredits { .. })
        ));
    }

    #[test]
    fn test_empty_description_rejected() {
        let ledger = CreditLedger::new();
        let result = ledger.apply_transaction(
            &user("alice"),
            Credits::new(10),
            TransactionKind::Bonus,
            "  ",
            None,
        );
        assert!(matches!(result, Err(LedgerError::EmptyDescription)));
    }

    #[test]
    fn test_balance_always_matches_log() {
        let ledger = CreditLedger::new();
        let alice = user("alice");

        ledger
            .apply_transaction(&alice, Credits::new(100), TransactionKind::Bonus, "b", None)
            .unwrap();
        ledger
            .apply_transaction(&alice, Credits::new(-40), TransactionKind::Spend, "s", None)
            .unwrap();
        ledger
            .apply_transaction(&alice, Credits::new(3), TransactionKind::Earn, "e", None)
            .unwrap();

        let report = ledger.reconcile(&alice);
        assert!(report.is_consistent());
        assert_eq!(report.cached, Credits::new(63));
    }

    #[test]
    fn test_chain_verifies_after_many_applies() {
        let ledger = CreditLedger::new();
        let alice = user("alice");
        ledger
            .apply_transaction(&alice, Credits::new(50), TransactionKind::Bonus, "b", None)
            .unwrap();
        for i in 0..10 {
            ledger
                .apply_transaction(
                    &alice,
                    Credits::new(1),
                    TransactionKind::Earn,
                    format!("reward {}", i),
                    None,
                )
                .unwrap();
        }
        assert!(ledger.verify_user_chain(&alice).is_ok());
    }

    #[test]
    fn test_from_records_rebuilds_state() {
        let ledger = CreditLedger::new();
        let alice = user("alice");
        let bob = user("bob");

        ledger
            .apply_transaction(&alice, Credits::new(100), TransactionKind::Bonus, "b", None)
            .unwrap();
        ledger
            .apply_transaction(&alice, Credits::new(-10), TransactionKind::Spend, "s", None)
            .unwrap();
        ledger
            .apply_transaction(&bob, Credits::new(7), TransactionKind::Earn, "e", None)
            .unwrap();

        let rebuilt = CreditLedger::from_records(ledger.all_transactions());

        assert_eq!(rebuilt.balance(&alice), Credits::new(90));
        assert_eq!(rebuilt.balance(&bob), Credits::new(7));
        assert!(rebuilt.reconcile(&alice).is_consistent());
        assert!(rebuilt.verify_user_chain(&alice).is_ok());

        let account = rebuilt.account(&alice).unwrap();
        assert_eq!(account.total_earned, Credits::new(100));
        assert_eq!(account.total_spent, Credits::new(10));
    }

    #[test]
    fn test_concurrent_applies_keep_invariant() {
        use std::sync::Arc;
        use std::thread;

        let ledger = Arc::new(ledger_with_balance("alice", 1000));
        let mut handles = Vec::new();

        for i in 0..8 {
            let ledger = Arc::clone(&ledger);
            handles.push(thread::spawn(move || {
                for j in 0..50 {
                    let amount = if (i + j) % 2 == 0 {
                        Credits::new(2)
                    } else {
                        Credits::new(-1)
                    };
                    let kind = if amount.is_negative() {
                        TransactionKind::Spend
                    } else {
                        TransactionKind::Earn
                    };
                    ledger
                        .apply_transaction(
                            &UserId::new("alice").unwrap(),
                            amount,
                            kind,
                            "stress",
                            None,
                        )
                        .unwrap();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let report = ledger.reconcile(&UserId::new("alice").unwrap());
        assert!(report.is_consistent());
        assert!(ledger
            .verify_user_chain(&UserId::new("alice").unwrap())
            .is_ok());
    }
}
