//! Entry ordering and grouping by parent.
//!
//! Searches and bulk reads share one ordering: newest `occurred_at` first,
//! ties broken by descending entry id. The order is total, so repeated reads
//! of the same data return the same sequence.

use std::cmp::Ordering;
use std::collections::HashMap;

use tally_shared::types::ParentId;

use super::entry::LedgerEntry;

/// Entries grouped by parent, each group in search order.
pub type GroupedEntries = HashMap<ParentId, Vec<LedgerEntry>>;

/// Compares two entries in search order.
#[must_use]
pub fn search_order(a: &LedgerEntry, b: &LedgerEntry) -> Ordering {
    b.occurred_at
        .cmp(&a.occurred_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Sorts entries in place into search order.
pub fn sort_for_search(entries: &mut [LedgerEntry]) {
    entries.sort_by(search_order);
}

/// Groups entries under the given parents.
///
/// Every id in `parent_ids` gets a key, with an empty vector when it has no
/// entries. Entries whose parent is not listed are dropped. Input order is
/// preserved within a group, so rows fetched in search order stay in it.
#[must_use]
pub fn group_by_parent<I>(parent_ids: I, entries: Vec<LedgerEntry>) -> GroupedEntries
where
    I: IntoIterator<Item = ParentId>,
{
    let mut grouped: GroupedEntries = parent_ids.into_iter().map(|id| (id, Vec::new())).collect();

    for entry in entries {
        if let Some(group) = grouped.get_mut(&entry.parent_id) {
            group.push(entry);
        }
    }

    grouped
}
