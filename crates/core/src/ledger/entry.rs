//! Ledger entry domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{LedgerEntryId, ParentId};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Increases the parent balance.
    Credit,
    /// Decreases the parent balance.
    Debit,
}

impl EntryKind {
    /// Returns the signed balance delta for applying an entry of this kind.
    ///
    /// `amount` is always positive; the sign comes from the kind.
    #[must_use]
    pub const fn delta(self, amount: i64) -> i64 {
        match self {
            Self::Credit => amount,
            Self::Debit => -amount,
        }
    }

    /// Returns the kind whose application undoes this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }

    /// Storage representation of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An applied, immutable record of one balance-affecting event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,
    /// The account or asset this entry belongs to.
    pub parent_id: ParentId,
    /// Credit or debit.
    pub kind: EntryKind,
    /// Amount in minor units, always positive.
    pub amount: i64,
    /// Free-form description.
    pub memo: String,
    /// When the event happened, as reported by the caller.
    pub occurred_at: DateTime<Utc>,
    /// When the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed amount (positive for credit, negative for debit).
    #[must_use]
    pub const fn signed_amount(&self) -> i64 {
        self.kind.delta(self.amount)
    }
}

/// Input for applying a new entry to a parent.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Target account or asset.
    pub parent_id: ParentId,
    /// Credit or debit.
    pub kind: EntryKind,
    /// Amount in minor units (must be positive).
    pub amount: i64,
    /// Free-form description.
    pub memo: String,
    /// When the event happened.
    pub occurred_at: DateTime<Utc>,
}

impl NewEntry {
    /// Creates a credit entry input.
    #[must_use]
    pub fn credit(
        parent_id: ParentId,
        amount: i64,
        memo: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            parent_id,
            kind: EntryKind::Credit,
            amount,
            memo: memo.into(),
            occurred_at,
        }
    }

    /// Creates a debit entry input.
    #[must_use]
    pub fn debit(
        parent_id: ParentId,
        amount: i64,
        memo: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            parent_id,
            kind: EntryKind::Debit,
            amount,
            memo: memo.into(),
            occurred_at,
        }
    }
}
