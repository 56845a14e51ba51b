//! `SeaORM` Entity for parents table.
//!
//! A parent is an account or an asset. It carries the stored balance and
//! the version counter that serializes balance writes.

use chrono::Utc;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use tally_core::ledger::Parent;
use tally_shared::types::{ParentId, UserId};

use super::sea_orm_active_enums::ParentKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "parents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: ParentKind,
    pub name: String,
    pub balance: i64,
    pub initial_balance: i64,
    pub version: i64,
    pub deleted: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Parent {
    fn from(model: Model) -> Self {
        Self {
            id: ParentId::from_uuid(model.id),
            owner_id: UserId::from_uuid(model.owner_id),
            kind: model.kind.into(),
            name: model.name,
            balance: model.balance,
            initial_balance: model.initial_balance,
            version: model.version,
            deleted: model.deleted,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
