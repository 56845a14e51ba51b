//! Ledger service: the rules behind every balance write.
//!
//! This service contains pure business logic with no database dependencies.
//! The storage layer loads state, asks the service for a plan, and then
//! persists the entry change together with the planned balance write in one
//! unit of work.

use chrono::{DateTime, Utc};
use tally_shared::types::{LedgerEntryId, UserId};

use super::balance::{BalanceChange, plan_movement};
use super::entry::{LedgerEntry, NewEntry};
use super::error::LedgerError;
use super::guard::assert_live_owner;
use super::types::Parent;
use super::validation::{normalize_timestamp, validate_new_entry};

/// A fully validated entry insert plus the balance write that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyPlan {
    /// The entry to insert.
    pub entry: LedgerEntry,
    /// The version-checked balance write.
    pub change: BalanceChange,
}

/// A validated entry delete plus the inverse balance write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversePlan {
    /// The entry to delete.
    pub entry_id: LedgerEntryId,
    /// The version-checked balance write.
    pub change: BalanceChange,
}

/// Ledger service for apply/reverse planning.
pub struct LedgerService;

impl LedgerService {
    /// Plans applying `input` to `parent` on behalf of `principal_id`.
    ///
    /// Order of checks:
    /// 1. Amount and memo
    /// 2. Ownership
    /// 3. Parent not deleted
    /// 4. Debit covered / credit does not overflow
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a `LedgerError`.
    pub fn plan_apply(
        parent: &Parent,
        input: &NewEntry,
        principal_id: UserId,
        recorded_at: DateTime<Utc>,
    ) -> Result<ApplyPlan, LedgerError> {
        validate_new_entry(input)?;

        if input.parent_id != parent.id {
            return Err(LedgerError::Internal(format!(
                "entry targets parent {} but parent {} was loaded",
                input.parent_id, parent.id
            )));
        }

        assert_live_owner(parent, principal_id)?;
        let change = plan_movement(parent, input.kind, input.amount)?;

        let entry = LedgerEntry {
            id: LedgerEntryId::new(),
            parent_id: parent.id,
            kind: input.kind,
            amount: input.amount,
            memo: input.memo.trim().to_string(),
            occurred_at: normalize_timestamp(input.occurred_at),
            recorded_at: normalize_timestamp(recorded_at),
        };

        Ok(ApplyPlan { entry, change })
    }

    /// Plans reversing `entry`, which must belong to `parent`.
    ///
    /// The inverse delta goes through the same movement rules as a new
    /// entry: reversing a credit is a debit of the same amount and must be
    /// covered by the current balance.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied`, `ParentNotFound` (deleted parent),
    /// `InsufficientBalance` or `BalanceOverflow`.
    pub fn plan_reverse(
        parent: &Parent,
        entry: &LedgerEntry,
        principal_id: UserId,
    ) -> Result<ReversePlan, LedgerError> {
        if entry.parent_id != parent.id {
            return Err(LedgerError::Internal(format!(
                "entry {} belongs to parent {} but parent {} was loaded",
                entry.id, entry.parent_id, parent.id
            )));
        }

        assert_live_owner(parent, principal_id)?;
        let change = plan_movement(parent, entry.kind.inverse(), entry.amount)?;

        Ok(ReversePlan {
            entry_id: entry.id,
            change,
        })
    }
}
