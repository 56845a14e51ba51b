//! Property-based tests for LedgerService.
//!
//! Drives the service against an in-memory book that applies plans the way
//! the store does: insert/delete the entry and write the planned balance
//! with a version bump, or do nothing at all on error.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use tally_shared::types::{LedgerEntryId, ParentId, UserId};

use super::aggregate::sort_for_search;
use super::balance::BalanceReconciliation;
use super::entry::{EntryKind, LedgerEntry, NewEntry};
use super::error::LedgerError;
use super::filter::EntryFilter;
use super::service::LedgerService;
use super::types::{Parent, ParentKind};

/// Minimal in-memory stand-in for the parent row plus its entries.
struct Book {
    parent: Parent,
    entries: Vec<LedgerEntry>,
}

impl Book {
    fn new(owner: UserId, initial_balance: i64) -> Self {
        Self {
            parent: Parent {
                id: ParentId::new(),
                owner_id: owner,
                kind: ParentKind::Account,
                name: "Checking".to_string(),
                balance: initial_balance,
                initial_balance,
                version: 0,
                deleted: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            entries: Vec::new(),
        }
    }

    fn apply(&mut self, kind: EntryKind, amount: i64, minute: i64) -> Result<LedgerEntry, LedgerError> {
        let occurred_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute);
        let input = NewEntry {
            parent_id: self.parent.id,
            kind,
            amount,
            memo: String::new(),
            occurred_at,
        };
        let plan = LedgerService::plan_apply(&self.parent, &input, self.parent.owner_id, Utc::now())?;
        self.parent.balance = plan.change.new_balance;
        self.parent.version = plan.change.next_version();
        self.entries.push(plan.entry.clone());
        Ok(plan.entry)
    }

    fn reverse(&mut self, entry_id: LedgerEntryId) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let plan = LedgerService::plan_reverse(&self.parent, &entry, self.parent.owner_id)?;
        self.entries.retain(|e| e.id != plan.entry_id);
        self.parent.balance = plan.change.new_balance;
        self.parent.version = plan.change.next_version();
        Ok(())
    }

    fn search(&self, filter: &EntryFilter) -> Vec<LedgerEntry> {
        let mut found: Vec<LedgerEntry> = self.entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        sort_for_search(&mut found);
        found
    }
}

fn kind_strategy() -> impl Strategy<Value = EntryKind> {
    prop_oneof![Just(EntryKind::Credit), Just(EntryKind::Debit)]
}

fn ops_strategy() -> impl Strategy<Value = Vec<(EntryKind, i64, i64)>> {
    prop::collection::vec((kind_strategy(), 1i64..50_000, 0i64..1_000), 0..40)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Without reversals the stored balance equals the initial balance plus
    /// the signed sum of accepted entries.
    #[test]
    fn prop_balance_matches_history(
        initial in 0i64..100_000,
        ops in ops_strategy(),
    ) {
        let mut book = Book::new(UserId::new(), initial);
        for (kind, amount, minute) in ops {
            let _ = book.apply(kind, amount, minute);
        }

        let credits: i64 = book.entries.iter().filter(|e| e.kind == EntryKind::Credit).map(|e| e.amount).sum();
        let debits: i64 = book.entries.iter().filter(|e| e.kind == EntryKind::Debit).map(|e| e.amount).sum();
        prop_assert_eq!(book.parent.balance, initial + credits - debits);
        prop_assert!(BalanceReconciliation::from_entries(&book.parent, &book.entries).is_consistent());
        prop_assert!(book.parent.balance >= 0);
    }

    /// A rejected debit leaves balance, version and entry count unchanged.
    #[test]
    fn prop_uncovered_debit_changes_nothing(
        initial in 0i64..100_000,
        excess in 1i64..100_000,
    ) {
        let mut book = Book::new(UserId::new(), initial);
        let version = book.parent.version;

        let result = book.apply(EntryKind::Debit, initial + excess, 0);

        let is_insufficient = matches!(result, Err(LedgerError::InsufficientBalance { .. }));
        prop_assert!(is_insufficient);
        prop_assert_eq!(book.parent.balance, initial);
        prop_assert_eq!(book.parent.version, version);
        prop_assert!(book.entries.is_empty());
    }

    /// Reversing the most recent entry restores the balance from before it
    /// was applied and removes it from search.
    #[test]
    fn prop_reverse_restores_previous_balance(
        initial in 0i64..100_000,
        ops in ops_strategy(),
        kind in kind_strategy(),
        amount in 1i64..50_000,
    ) {
        let mut book = Book::new(UserId::new(), initial);
        for (k, a, m) in ops {
            let _ = book.apply(k, a, m);
        }

        let before = book.parent.balance;
        if let Ok(entry) = book.apply(kind, amount, 500) {
            book.reverse(entry.id).unwrap();
            prop_assert_eq!(book.parent.balance, before);
            prop_assert!(book.search(&EntryFilter::new()).iter().all(|e| e.id != entry.id));
        }
    }

    /// Every write bumps the version by exactly one.
    #[test]
    fn prop_version_counts_writes(
        initial in 0i64..100_000,
        ops in ops_strategy(),
    ) {
        let mut book = Book::new(UserId::new(), initial);
        let mut writes = 0i64;
        for (kind, amount, minute) in ops {
            if book.apply(kind, amount, minute).is_ok() {
                writes += 1;
            }
        }
        prop_assert_eq!(book.parent.version, writes);
    }

    /// Non-positive amounts are always rejected before anything else.
    #[test]
    fn prop_non_positive_amount_rejected(
        kind in kind_strategy(),
        amount in i64::MIN..=0,
    ) {
        let mut book = Book::new(UserId::new(), 1_000);
        let result = book.apply(kind, amount, 0);
        let is_invalid = matches!(result, Err(LedgerError::InvalidAmount(a)) if a == amount);
        prop_assert!(is_invalid);
        prop_assert_eq!(book.parent.balance, 1_000);
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// 10000 → credit 500 → debit 20000 rejected → debit 3000 → reverse.
    #[test]
    fn test_salary_scenario() {
        let mut book = Book::new(UserId::new(), 10_000);

        book.apply(EntryKind::Credit, 500, 0).unwrap();
        assert_eq!(book.parent.balance, 10_500);
        assert_eq!(book.entries.len(), 1);

        let err = book.apply(EntryKind::Debit, 20_000, 1).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(book.parent.balance, 10_500);
        assert_eq!(book.entries.len(), 1);

        let last = book.apply(EntryKind::Debit, 3_000, 2).unwrap();
        assert_eq!(book.parent.balance, 7_500);
        assert_eq!(book.entries.len(), 2);

        book.reverse(last.id).unwrap();
        assert_eq!(book.parent.balance, 10_500);
        assert_eq!(book.entries.len(), 1);
    }

    #[test]
    fn test_reverse_old_debit_after_spending_is_allowed() {
        // Reversing a debit adds funds back, so it never overdraws.
        let mut book = Book::new(UserId::new(), 1_000);
        let debit = book.apply(EntryKind::Debit, 1_000, 0).unwrap();
        book.apply(EntryKind::Credit, 50, 1).unwrap();
        book.reverse(debit.id).unwrap();
        assert_eq!(book.parent.balance, 1_050);
    }

    #[test]
    fn test_reverse_spent_credit_is_rejected() {
        let mut book = Book::new(UserId::new(), 0);
        let credit = book.apply(EntryKind::Credit, 500, 0).unwrap();
        book.apply(EntryKind::Debit, 400, 1).unwrap();

        let err = book.reverse(credit.id).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { balance: 100, requested: 500, .. }));
        assert_eq!(book.parent.balance, 100);
        assert_eq!(book.entries.len(), 2);
    }

    #[test]
    fn test_date_range_search() {
        let mut book = Book::new(UserId::new(), 0);
        for minute in [0, 10, 20, 30] {
            book.apply(EntryKind::Credit, 1, minute).unwrap();
        }
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 10, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 1, 1, 0, 20, 0).unwrap();

        let found = book.search(&EntryFilter::new().between(start, end));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].occurred_at, end);
        assert_eq!(found[1].occurred_at, start);
    }
}
