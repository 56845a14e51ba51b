//! Entity re-exports.

pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::parents::Entity as Parents;
