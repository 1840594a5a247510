//! Per-user account - cached projection over the transaction log
//!
//! The account is a projection: `balance` must always equal the sum of the
//! user's transaction amounts. `CreditLedger` is the sole writer.

use crate::transaction::{CreditTransaction, TransactionKind, GENESIS_HASH};
use chrono::{DateTime, Utc};
use engex_core::{Credits, UserId};
use serde::{Deserialize, Serialize};

/// Cached balance and lifetime totals for one user, together with the user's
/// own append-only transaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: UserId,
    pub balance: Credits,
    pub total_earned: Credits,
    pub total_spent: Credits,
    pub last_active: DateTime<Utc>,
    pub(crate) transactions: Vec<CreditTransaction>,
}

impl UserAccount {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            balance: Credits::ZERO,
            total_earned: Credits::ZERO,
            total_spent: Credits::ZERO,
            last_active: Utc::now(),
            transactions: Vec::new(),
        }
    }

    /// Sequence for the next record (per-user, starting at 1)
    pub(crate) fn next_sequence(&self) -> u64 {
        self.transactions.len() as u64 + 1
    }

    /// Hash the next record must link to
    pub(crate) fn last_hash(&self) -> String {
        self.transactions
            .last()
            .map(|tx| tx.hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string())
    }

    /// Absorb a committed record: set the cached balance from the record and
    /// roll the lifetime totals. Used by both the live apply path and journal
    /// replay so the two can never diverge.
    pub(crate) fn absorb(&mut self, tx: CreditTransaction) {
        self.balance = tx.resulting_balance;
        match tx.kind {
            TransactionKind::Earn | TransactionKind::Bonus => {
                self.total_earned = Credits::new(
                    self.total_earned.value().saturating_add(tx.amount.value()),
                );
            }
            TransactionKind::Spend => {
                self.total_spent = Credits::new(
                    self.total_spent
                        .value()
                        .saturating_add(tx.amount.abs().value()),
                );
            }
            // Refunds and admin corrections only move the balance
            TransactionKind::Refund | TransactionKind::AdminAdjustment => {}
        }
        self.last_active = tx.created_at;
        self.transactions.push(tx);
    }

    /// Recompute the balance from the full transaction log
    pub fn recomputed_balance(&self) -> Credits {
        self.transactions.iter().map(|tx| tx.amount).sum()
    }

    pub fn transactions(&self) -> &[CreditTransaction] {
        &self.transactions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::calculate_transaction_hash;
    use uuid::Uuid;

    fn tx(account: &UserAccount, kind: TransactionKind, amount: i64) -> CreditTransaction {
        let amount = Credits::new(amount);
        let mut tx = CreditTransaction {
            id: Uuid::new_v4(),
            user_id: account.user_id.clone(),
            kind,
            amount,
            resulting_balance: account.balance.checked_add(amount).unwrap(),
            description: "test".to_string(),
            related: None,
            sequence: account.next_sequence(),
            prev_hash: account.last_hash(),
            hash: String::new(),
            created_at: Utc::now(),
        };
        tx.hash = calculate_transaction_hash(&tx);
        tx
    }

    #[test]
    fn test_absorb_rolls_totals() {
        let mut account = UserAccount::new(UserId::new("alice").unwrap());
        account.absorb(tx(&account, TransactionKind::Bonus, 100));
        account.absorb(tx(&account, TransactionKind::Spend, -30));
        account.absorb(tx(&account, TransactionKind::Earn, 5));

        assert_eq!(account.balance, Credits::new(75));
        assert_eq!(account.total_earned, Credits::new(105));
        assert_eq!(account.total_spent, Credits::new(30));
        assert_eq!(account.recomputed_balance(), account.balance);
    }

    #[test]
    fn test_refund_only_moves_balance() {
        let mut account = UserAccount::new(UserId::new("bob").unwrap());
        account.absorb(tx(&account, TransactionKind::Bonus, 50));
        account.absorb(tx(&account, TransactionKind::Refund, 10));

        assert_eq!(account.balance, Credits::new(60));
        assert_eq!(account.total_earned, Credits::new(50));
        assert_eq!(account.total_spent, Credits::ZERO);
    }

    #[test]
    fn test_sequence_and_hash_linking() {
        let mut account = UserAccount::new(UserId::new("carol").unwrap());
        assert_eq!(account.next_sequence(), 1);
        assert_eq!(account.last_hash(), GENESIS_HASH);

        account.absorb(tx(&account, TransactionKind::Bonus, 1));
        assert_eq!(account.next_sequence(), 2);
        assert_eq!(account.last_hash(), account.transactions[0].hash);
    }
}
