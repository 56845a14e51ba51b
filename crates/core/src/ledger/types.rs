//! Parent (account or asset) domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{ParentId, UserId};

/// What a parent represents for its owner.
///
/// Both kinds follow the same ledger rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentKind {
    /// A money account (bank, card, wallet).
    Account,
    /// A held asset (property, holdings).
    Asset,
}

impl ParentKind {
    /// Storage representation of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Asset => "asset",
        }
    }
}

/// An account or asset whose balance is driven by ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    /// Unique identifier.
    pub id: ParentId,
    /// The principal that owns this parent.
    pub owner_id: UserId,
    /// Account or asset.
    pub kind: ParentKind,
    /// Display name.
    pub name: String,
    /// Current balance in minor units.
    pub balance: i64,
    /// Balance at creation, before any entry.
    pub initial_balance: i64,
    /// Incremented on every balance write.
    pub version: i64,
    /// Soft-deleted parents accept no new entries.
    pub deleted: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}
