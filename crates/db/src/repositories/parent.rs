//! Parent repository: the holdings side of accounts and assets.
//!
//! Owns the non-balance fields of a parent. Balance and version are only
//! ever written by the ledger repository.

use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use tracing::info;

use tally_core::ledger::{LedgerError, Parent, ParentKind, assert_live_owner};
use tally_shared::AppError;
use tally_shared::types::{ParentId, UserId};

use crate::entities::{parents, sea_orm_active_enums};

/// Longest parent name accepted, in characters.
pub const MAX_NAME_LEN: usize = 255;

/// Error types for parent operations.
#[derive(Debug, thiserror::Error)]
pub enum ParentError {
    /// Name is blank after trimming.
    #[error("Parent name cannot be empty")]
    EmptyName,

    /// Name is longer than the column allows.
    #[error("Parent name is {0} characters, maximum is {MAX_NAME_LEN}")]
    NameTooLong(usize),

    /// Initial balance below zero.
    #[error("Initial balance cannot be negative: {0}")]
    NegativeInitialBalance(i64),

    /// Not found or not owned by the caller.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ParentError> for AppError {
    fn from(err: ParentError) -> Self {
        match err {
            ParentError::EmptyName
            | ParentError::NameTooLong(_)
            | ParentError::NegativeInitialBalance(_) => Self::Validation(err.to_string()),
            ParentError::Ledger(inner) => inner.into(),
            ParentError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}

/// Input for creating a parent.
#[derive(Debug, Clone)]
pub struct CreateParentInput {
    /// Owning user.
    pub owner_id: UserId,
    /// Account or asset.
    pub kind: ParentKind,
    /// Display name.
    pub name: String,
    /// Opening balance in minor units.
    pub initial_balance: i64,
}

/// Parent repository for holdings operations.
#[derive(Debug, Clone)]
pub struct ParentRepository {
    db: DatabaseConnection,
}

impl ParentRepository {
    /// Creates a new parent repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a parent whose balance starts at its initial balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or too long, the initial
    /// balance is negative, or the insert fails.
    pub async fn create_parent(&self, input: CreateParentInput) -> Result<Parent, ParentError> {
        let name = validate_name(&input.name)?;
        if input.initial_balance < 0 {
            return Err(ParentError::NegativeInitialBalance(input.initial_balance));
        }

        let now = tally_core::ledger::normalize_timestamp(Utc::now());
        let parent = Parent {
            id: ParentId::new(),
            owner_id: input.owner_id,
            kind: input.kind,
            name,
            balance: input.initial_balance,
            initial_balance: input.initial_balance,
            version: 0,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        let model = parents::ActiveModel {
            id: Set(parent.id.into_inner()),
            owner_id: Set(parent.owner_id.into_inner()),
            kind: Set(parent.kind.into()),
            name: Set(parent.name.clone()),
            balance: Set(parent.balance),
            initial_balance: Set(parent.initial_balance),
            version: Set(parent.version),
            deleted: Set(parent.deleted),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        parents::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await?;

        info!(parent_id = %parent.id, owner_id = %parent.owner_id, kind = %parent.kind.as_str(), "Parent created");
        Ok(parent)
    }

    /// Finds a parent by ID, deleted or not, without an ownership check.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_parent(&self, parent_id: ParentId) -> Result<Option<Parent>, DbErr> {
        let model = parents::Entity::find_by_id(parent_id.into_inner())
            .one(&self.db)
            .await?;
        Ok(model.map(Parent::from))
    }

    /// Loads a live parent owned by `principal_id`.
    ///
    /// # Errors
    ///
    /// Returns `ParentNotFound` if absent or deleted, `AccessDenied` if owned
    /// by someone else.
    pub async fn get_parent(
        &self,
        parent_id: ParentId,
        principal_id: UserId,
    ) -> Result<Parent, ParentError> {
        let parent = self
            .find_parent(parent_id)
            .await?
            .ok_or(LedgerError::ParentNotFound(parent_id))?;
        assert_live_owner(&parent, principal_id)?;
        Ok(parent)
    }

    /// Lists an owner's live parents ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_parents(
        &self,
        owner_id: UserId,
        kind: Option<ParentKind>,
    ) -> Result<Vec<Parent>, DbErr> {
        let mut query = parents::Entity::find()
            .filter(parents::Column::OwnerId.eq(owner_id.into_inner()))
            .filter(parents::Column::Deleted.eq(false));

        if let Some(kind) = kind {
            query = query
                .filter(parents::Column::Kind.eq(sea_orm_active_enums::ParentKind::from(kind)));
        }

        let models = query
            .order_by_asc(parents::Column::Name)
            .order_by_asc(parents::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Parent::from).collect())
    }

    /// Renames a live parent.
    ///
    /// Touches only the name and `updated_at`, so it never races a balance
    /// write.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid, the parent is missing or
    /// deleted, or the caller does not own it.
    pub async fn rename_parent(
        &self,
        parent_id: ParentId,
        principal_id: UserId,
        name: &str,
    ) -> Result<Parent, ParentError> {
        let name = validate_name(name)?;
        self.get_parent(parent_id, principal_id).await?;

        let now: sea_orm::prelude::DateTimeWithTimeZone =
            tally_core::ledger::normalize_timestamp(Utc::now()).into();
        parents::Entity::update_many()
            .col_expr(parents::Column::Name, Expr::value(name.clone()))
            .col_expr(parents::Column::UpdatedAt, Expr::value(now))
            .filter(parents::Column::Id.eq(parent_id.into_inner()))
            .filter(parents::Column::Deleted.eq(false))
            .exec(&self.db)
            .await?;

        info!(%parent_id, "Parent renamed");
        self.get_parent(parent_id, principal_id).await
    }

    /// Soft-deletes a parent. Its entries stay in place but it accepts no
    /// new ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is missing or already deleted, or the
    /// caller does not own it.
    pub async fn soft_delete_parent(
        &self,
        parent_id: ParentId,
        principal_id: UserId,
    ) -> Result<(), ParentError> {
        self.get_parent(parent_id, principal_id).await?;

        let now: sea_orm::prelude::DateTimeWithTimeZone =
            tally_core::ledger::normalize_timestamp(Utc::now()).into();
        let result = parents::Entity::update_many()
            .col_expr(parents::Column::Deleted, Expr::value(true))
            .col_expr(parents::Column::UpdatedAt, Expr::value(now))
            .filter(parents::Column::Id.eq(parent_id.into_inner()))
            .filter(parents::Column::Deleted.eq(false))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(LedgerError::ParentNotFound(parent_id).into());
        }

        info!(%parent_id, "Parent deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, ParentError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ParentError::EmptyName);
    }
    let len = trimmed.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ParentError::NameTooLong(len));
    }
    Ok(trimmed.to_string())
}
