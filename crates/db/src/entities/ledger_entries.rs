//! `SeaORM` Entity for ledger_entries table.

use chrono::Utc;
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::ledger::LedgerEntry;
use tally_shared::types::{LedgerEntryId, ParentId};

use super::sea_orm_active_enums::EntryKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub parent_id: Uuid,
    pub kind: EntryKind,
    pub amount: i64,
    pub memo: String,
    pub occurred_at: DateTimeWithTimeZone,
    pub recorded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::parents::Entity",
        from = "Column::ParentId",
        to = "super::parents::Column::Id"
    )]
    Parents,
}

impl Related<super::parents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for LedgerEntry {
    fn from(model: Model) -> Self {
        Self {
            id: LedgerEntryId::from_uuid(model.id),
            parent_id: ParentId::from_uuid(model.parent_id),
            kind: model.kind.into(),
            amount: model.amount,
            memo: model.memo,
            occurred_at: model.occurred_at.with_timezone(&Utc),
            recorded_at: model.recorded_at.with_timezone(&Utc),
        }
    }
}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: Set(entry.id.into_inner()),
            parent_id: Set(entry.parent_id.into_inner()),
            kind: Set(entry.kind.into()),
            amount: Set(entry.amount),
            memo: Set(entry.memo.clone()),
            occurred_at: Set(entry.occurred_at.into()),
            recorded_at: Set(entry.recorded_at.into()),
        }
    }
}
