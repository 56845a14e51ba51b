//! Parent balance calculations.
//!
//! A parent's stored balance must always equal its initial balance plus the
//! signed sum of its applied entries. These functions compute the next
//! balance for a write and recompute the derived balance for reconciliation.

use serde::{Deserialize, Serialize};
use tally_shared::types::ParentId;

use super::entry::{EntryKind, LedgerEntry};
use super::error::LedgerError;
use super::types::Parent;

/// A planned, version-checked balance write.
///
/// The store applies it as
/// `SET balance = new_balance, version = expected_version + 1
///  WHERE id = parent_id AND version = expected_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    /// Parent being written.
    pub parent_id: ParentId,
    /// Version read before planning.
    pub expected_version: i64,
    /// Balance before the write.
    pub previous_balance: i64,
    /// Balance after the write.
    pub new_balance: i64,
}

impl BalanceChange {
    /// Signed delta applied by this change.
    #[must_use]
    pub const fn delta(&self) -> i64 {
        self.new_balance - self.previous_balance
    }

    /// Version the parent will carry once the change is written.
    #[must_use]
    pub const fn next_version(&self) -> i64 {
        self.expected_version + 1
    }
}

/// Computes the balance change for moving `amount` in direction `kind`.
///
/// Credits must not overflow. Debits must be covered by the current
/// balance, so a parent never goes below zero through this path.
///
/// # Errors
///
/// Returns `InsufficientBalance` for an uncovered debit and
/// `BalanceOverflow` for a credit past `i64::MAX`.
pub fn plan_movement(
    parent: &Parent,
    kind: EntryKind,
    amount: i64,
) -> Result<BalanceChange, LedgerError> {
    let new_balance = match kind {
        EntryKind::Credit => parent
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow(parent.id))?,
        EntryKind::Debit => {
            if amount > parent.balance {
                return Err(LedgerError::InsufficientBalance {
                    parent_id: parent.id,
                    balance: parent.balance,
                    requested: amount,
                });
            }
            parent.balance - amount
        }
    };

    Ok(BalanceChange {
        parent_id: parent.id,
        expected_version: parent.version,
        previous_balance: parent.balance,
        new_balance,
    })
}

/// Result of recomputing a parent's balance from its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceReconciliation {
    /// The parent.
    pub parent_id: ParentId,
    /// Balance stored on the parent.
    pub stored: i64,
    /// `initial + credits - debits`.
    pub derived: i64,
    /// Sum of credit amounts.
    pub credit_total: i64,
    /// Sum of debit amounts.
    pub debit_total: i64,
    /// Number of applied entries.
    pub entry_count: u64,
}

impl BalanceReconciliation {
    /// Recomputes the derived balance from `(kind, amount)` pairs.
    ///
    /// Totals saturate rather than wrap; a saturated total can never
    /// reconcile with a stored `i64` balance built through checked writes.
    #[must_use]
    pub fn compute<I>(parent: &Parent, movements: I) -> Self
    where
        I: IntoIterator<Item = (EntryKind, i64)>,
    {
        let mut credit_total: i64 = 0;
        let mut debit_total: i64 = 0;
        let mut entry_count: u64 = 0;

        for (kind, amount) in movements {
            match kind {
                EntryKind::Credit => credit_total = credit_total.saturating_add(amount),
                EntryKind::Debit => debit_total = debit_total.saturating_add(amount),
            }
            entry_count += 1;
        }

        let derived = parent
            .initial_balance
            .saturating_add(credit_total)
            .saturating_sub(debit_total);

        Self {
            parent_id: parent.id,
            stored: parent.balance,
            derived,
            credit_total,
            debit_total,
            entry_count,
        }
    }

    /// Recomputes from full entries.
    #[must_use]
    pub fn from_entries(parent: &Parent, entries: &[LedgerEntry]) -> Self {
        Self::compute(parent, entries.iter().map(|e| (e.kind, e.amount)))
    }

    /// True when the stored balance matches the entry history.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.stored == self.derived
    }

    /// Stored minus derived.
    #[must_use]
    pub const fn drift(&self) -> i64 {
        self.stored.saturating_sub(self.derived)
    }
}
