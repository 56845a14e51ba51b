//! `SeaORM` active enums.
//!
//! Stored as short lowercase strings so the schema stays portable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::ledger;

/// Account or asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum ParentKind {
    /// Money account.
    #[sea_orm(string_value = "account")]
    Account,
    /// Held asset.
    #[sea_orm(string_value = "asset")]
    Asset,
}

/// Credit or debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum EntryKind {
    /// Increases the balance.
    #[sea_orm(string_value = "credit")]
    Credit,
    /// Decreases the balance.
    #[sea_orm(string_value = "debit")]
    Debit,
}

impl From<ParentKind> for ledger::ParentKind {
    fn from(kind: ParentKind) -> Self {
        match kind {
            ParentKind::Account => Self::Account,
            ParentKind::Asset => Self::Asset,
        }
    }
}

impl From<ledger::ParentKind> for ParentKind {
    fn from(kind: ledger::ParentKind) -> Self {
        match kind {
            ledger::ParentKind::Account => Self::Account,
            ledger::ParentKind::Asset => Self::Asset,
        }
    }
}

impl From<EntryKind> for ledger::EntryKind {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Credit => Self::Credit,
            EntryKind::Debit => Self::Debit,
        }
    }
}

impl From<ledger::EntryKind> for EntryKind {
    fn from(kind: ledger::EntryKind) -> Self {
        match kind {
            ledger::EntryKind::Credit => Self::Credit,
            ledger::EntryKind::Debit => Self::Debit,
        }
    }
}
