//! Ledger-consistency rules.
//!
//! This module implements the core ledger functionality:
//! - Parents (accounts and assets) and ledger entries
//! - Ownership guard
//! - Balance planning for apply and reverse
//! - Typed search filters
//! - Search ordering and per-parent grouping
//! - Error types for ledger operations

pub mod aggregate;
pub mod balance;
pub mod entry;
pub mod error;
pub mod filter;
pub mod guard;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use aggregate::{GroupedEntries, group_by_parent, search_order, sort_for_search};
pub use balance::{BalanceChange, BalanceReconciliation, plan_movement};
pub use entry::{EntryKind, LedgerEntry, NewEntry};
pub use error::{LedgerError, LedgerErrorKind};
pub use filter::EntryFilter;
pub use guard::{assert_live_owner, assert_owner, is_visible_to};
pub use service::{ApplyPlan, LedgerService, ReversePlan};
pub use types::{Parent, ParentKind};
pub use validation::{MAX_MEMO_LEN, normalize_timestamp, validate_amount, validate_memo};
