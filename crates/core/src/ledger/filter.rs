//! Typed search filter for ledger entries.
//!
//! Every field is optional; an unset bound is unconstrained and set bounds
//! are inclusive. The storage layer translates the filter into its own query.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::entry::{EntryKind, LedgerEntry};
use super::error::LedgerError;
use super::validation::normalize_timestamp;

/// Filter for entry searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Only entries of this kind.
    pub kind: Option<EntryKind>,
    /// Earliest `occurred_at` (inclusive).
    pub date_from: Option<DateTime<Utc>>,
    /// Latest `occurred_at` (inclusive).
    pub date_to: Option<DateTime<Utc>>,
    /// Smallest amount (inclusive).
    pub min_amount: Option<i64>,
    /// Largest amount (inclusive).
    pub max_amount: Option<i64>,
}

impl EntryFilter {
    /// Creates a new empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to one entry kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restricts `occurred_at` to `[from, to]`.
    #[must_use]
    pub const fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Restricts amount to `[min, max]`.
    #[must_use]
    pub const fn amount_between(mut self, min: i64, max: i64) -> Self {
        self.min_amount = Some(min);
        self.max_amount = Some(max);
        self
    }

    /// Returns true if the filter is empty (matches everything).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.min_amount.is_none()
            && self.max_amount.is_none()
    }

    /// Rejects inverted ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` or `InvalidAmountRange`.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to)
            && from > to
        {
            return Err(LedgerError::InvalidDateRange { from, to });
        }
        if let (Some(min), Some(max)) = (self.min_amount, self.max_amount)
            && min > max
        {
            return Err(LedgerError::InvalidAmountRange { min, max });
        }
        Ok(())
    }

    /// Aligns the date bounds to the microsecond grid entries are stored on.
    ///
    /// `date_from` rounds up and `date_to` rounds down, so a stored
    /// timestamp falls inside the aligned range exactly when it falls inside
    /// the original one. Backends then agree regardless of how they treat
    /// sub-microsecond parameters.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            date_from: self.date_from.map(ceil_to_micros),
            date_to: self.date_to.map(normalize_timestamp),
            ..self
        }
    }

    /// In-memory evaluation of the filter, equivalent to the store query.
    #[must_use]
    pub fn matches(&self, entry: &LedgerEntry) -> bool {
        self.kind.is_none_or(|k| entry.kind == k)
            && self.date_from.is_none_or(|from| entry.occurred_at >= from)
            && self.date_to.is_none_or(|to| entry.occurred_at <= to)
            && self.min_amount.is_none_or(|min| entry.amount >= min)
            && self.max_amount.is_none_or(|max| entry.amount <= max)
    }
}

fn ceil_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    let floor = normalize_timestamp(at);
    if floor == at {
        return at;
    }
    floor.checked_add_signed(TimeDelta::microseconds(1)).unwrap_or(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tally_shared::types::{LedgerEntryId, ParentId};

    fn entry(kind: EntryKind, amount: i64, day: u32) -> LedgerEntry {
        let at = Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap();
        LedgerEntry {
            id: LedgerEntryId::new(),
            parent_id: ParentId::new(),
            kind,
            amount,
            memo: String::new(),
            occurred_at: at,
            recorded_at: at,
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = EntryFilter::new();
        assert!(filter.is_empty());
        assert!(filter.validate().is_ok());
        assert!(filter.matches(&entry(EntryKind::Debit, 1, 1)));
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let e = entry(EntryKind::Credit, 100, 10);
        let exact = EntryFilter::new().between(e.occurred_at, e.occurred_at);
        assert!(exact.matches(&e));

        let after = EntryFilter::new().between(
            e.occurred_at + Duration::seconds(1),
            e.occurred_at + Duration::days(1),
        );
        assert!(!after.matches(&e));
    }

    #[test]
    fn test_kind_and_amount() {
        let filter = EntryFilter::new()
            .with_kind(EntryKind::Debit)
            .amount_between(100, 200);
        assert!(filter.matches(&entry(EntryKind::Debit, 100, 1)));
        assert!(filter.matches(&entry(EntryKind::Debit, 200, 1)));
        assert!(!filter.matches(&entry(EntryKind::Debit, 201, 1)));
        assert!(!filter.matches(&entry(EntryKind::Credit, 150, 1)));
    }

    #[test]
    fn test_inverted_date_range_rejected() {
        let from = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            EntryFilter::new().between(from, to).validate(),
            Err(LedgerError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_inverted_amount_range_rejected() {
        assert!(matches!(
            EntryFilter::new().amount_between(10, 5).validate(),
            Err(LedgerError::InvalidAmountRange { min: 10, max: 5 })
        ));
    }

    #[test]
    fn test_normalized_aligns_bounds_to_micros() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let filter = EntryFilter::new()
            .between(base + Duration::nanoseconds(500), base + Duration::nanoseconds(1_500))
            .normalized();

        assert_eq!(filter.date_from, Some(base + Duration::microseconds(1)));
        assert_eq!(filter.date_to, Some(base + Duration::microseconds(1)));
    }

    #[test]
    fn test_normalized_keeps_aligned_bounds() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let filter = EntryFilter::new()
            .between(base, base + Duration::microseconds(7))
            .with_kind(EntryKind::Debit);

        assert_eq!(filter.normalized(), filter);
    }

    #[test]
    fn test_normalized_agrees_with_matches_on_stored_entries() {
        let e = entry(EntryKind::Credit, 100, 10);
        let just_after = EntryFilter {
            date_from: Some(e.occurred_at + Duration::nanoseconds(500)),
            ..EntryFilter::default()
        };
        let just_before = EntryFilter {
            date_to: Some(e.occurred_at - Duration::nanoseconds(500)),
            ..EntryFilter::default()
        };

        for filter in [just_after, just_before] {
            assert!(!filter.matches(&e));
            assert!(!filter.normalized().matches(&e));
        }
    }

    #[test]
    fn test_one_sided_bounds_are_valid() {
        let filter = EntryFilter {
            min_amount: Some(1_000),
            ..EntryFilter::default()
        };
        assert!(filter.validate().is_ok());
        assert!(!filter.matches(&entry(EntryKind::Credit, 999, 1)));
    }
}
