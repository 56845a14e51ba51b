//! Ledger repository: balance-affecting entries and their queries.
//!
//! Every mutation reads the parent, asks `LedgerService` for a plan and then
//! commits the entry change together with a version-checked balance UPDATE
//! in one transaction. If another writer committed since the read, the
//! UPDATE matches no row, the transaction is dropped and the whole unit of
//! work is retried from the read.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, TransactionTrait, prelude::DateTimeWithTimeZone, sea_query::Expr,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::ledger::{
    ApplyPlan, BalanceChange, BalanceReconciliation, EntryFilter, GroupedEntries, LedgerEntry,
    LedgerError, LedgerService, NewEntry, Parent, ReversePlan, assert_live_owner,
    group_by_parent, is_visible_to, normalize_timestamp,
};
use tally_shared::types::{LedgerEntryId, ParentId, UserId};
use tally_shared::{AppError, LedgerConfig};

use crate::entities::{ledger_entries, parents, sea_orm_active_enums};

/// Error types for ledger store operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerStoreError {
    /// A ledger rule rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl LedgerStoreError {
    /// Returns the ledger error, if this is one.
    #[must_use]
    pub const fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(err) => Some(err),
            Self::Database(_) => None,
        }
    }

    /// Returns true if the unit of work should be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.as_ledger().is_some_and(LedgerError::is_retryable)
    }
}

impl From<LedgerStoreError> for AppError {
    fn from(err: LedgerStoreError) -> Self {
        match err {
            LedgerStoreError::Ledger(inner) => inner.into(),
            LedgerStoreError::Database(inner) => Self::Database(inner.to_string()),
        }
    }
}

/// Ledger repository for entry writes and reads.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
    max_retries: u32,
    retry_backoff: Duration,
    /// Version conflicts seen so far, shared by all clones.
    conflicts: Arc<AtomicU64>,
}

impl LedgerRepository {
    /// Creates a new ledger repository with default retry settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, &LedgerConfig::default())
    }

    /// Creates a new ledger repository with the given retry settings.
    #[must_use]
    pub fn with_config(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            conflicts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of version conflicts this repository (and its clones) has hit,
    /// retried or not.
    #[must_use]
    pub fn conflict_count(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Applies a new entry to its parent and writes the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The amount is not positive or the memo is too long
    /// - The parent does not exist, is deleted, or is owned by someone else
    /// - A debit exceeds the balance or a credit overflows it
    /// - Concurrent writers kept winning after all retries
    /// - Database operation fails
    pub async fn apply(
        &self,
        principal_id: UserId,
        input: NewEntry,
    ) -> Result<LedgerEntry, LedgerStoreError> {
        let input = &input;
        self.retry_on_conflict("apply", move || self.try_apply(principal_id, input))
            .await
    }

    async fn try_apply(
        &self,
        principal_id: UserId,
        input: &NewEntry,
    ) -> Result<LedgerEntry, LedgerStoreError> {
        let plan = self.prepare_apply(principal_id, input).await?;
        self.commit_apply(&plan).await?;
        Ok(plan.entry)
    }

    async fn prepare_apply(
        &self,
        principal_id: UserId,
        input: &NewEntry,
    ) -> Result<ApplyPlan, LedgerStoreError> {
        let parent = load_parent(&self.db, input.parent_id).await?;
        Ok(LedgerService::plan_apply(
            &parent,
            input,
            principal_id,
            Utc::now(),
        )?)
    }

    async fn commit_apply(&self, plan: &ApplyPlan) -> Result<(), LedgerStoreError> {
        let txn = self.db.begin().await?;

        write_balance(&txn, &plan.change).await?;
        ledger_entries::Entity::insert(ledger_entries::ActiveModel::from(&plan.entry))
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;

        info!(
            entry_id = %plan.entry.id,
            parent_id = %plan.entry.parent_id,
            kind = %plan.entry.kind,
            amount = plan.entry.amount,
            balance = plan.change.new_balance,
            "Ledger entry applied"
        );
        Ok(())
    }

    /// Reverses an entry: deletes it and applies the inverse delta.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The entry or its parent does not exist, or the parent is deleted
    /// - The caller does not own the parent
    /// - Reversing a credit would drive the balance below zero
    /// - Concurrent writers kept winning after all retries
    /// - Database operation fails
    pub async fn reverse(
        &self,
        principal_id: UserId,
        entry_id: LedgerEntryId,
    ) -> Result<(), LedgerStoreError> {
        self.retry_on_conflict("reverse", move || self.try_reverse(principal_id, entry_id))
            .await
    }

    async fn try_reverse(
        &self,
        principal_id: UserId,
        entry_id: LedgerEntryId,
    ) -> Result<(), LedgerStoreError> {
        let (entry, plan) = self.prepare_reverse(principal_id, entry_id).await?;
        self.commit_reverse(&entry, &plan).await
    }

    async fn prepare_reverse(
        &self,
        principal_id: UserId,
        entry_id: LedgerEntryId,
    ) -> Result<(LedgerEntry, ReversePlan), LedgerStoreError> {
        let entry: LedgerEntry = ledger_entries::Entity::find_by_id(entry_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?
            .into();
        let parent = load_parent(&self.db, entry.parent_id).await?;
        let plan = LedgerService::plan_reverse(&parent, &entry, principal_id)?;
        Ok((entry, plan))
    }

    async fn commit_reverse(
        &self,
        entry: &LedgerEntry,
        plan: &ReversePlan,
    ) -> Result<(), LedgerStoreError> {
        let txn = self.db.begin().await?;

        write_balance(&txn, &plan.change).await?;
        let deleted = ledger_entries::Entity::delete_by_id(plan.entry_id.into_inner())
            .exec(&txn)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(LedgerError::EntryNotFound(plan.entry_id).into());
        }

        txn.commit().await?;

        info!(
            entry_id = %plan.entry_id,
            parent_id = %entry.parent_id,
            kind = %entry.kind,
            amount = entry.amount,
            balance = plan.change.new_balance,
            "Ledger entry reversed"
        );
        Ok(())
    }

    /// Runs `unit_of_work` until it stops failing with a version conflict or
    /// `max_retries` retries are spent. Each retry sleeps `retry_backoff`
    /// times the attempt number.
    async fn retry_on_conflict<T, F, Fut>(
        &self,
        operation: &'static str,
        mut unit_of_work: F,
    ) -> Result<T, LedgerStoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LedgerStoreError>>,
    {
        let mut attempt = 0;
        loop {
            match unit_of_work().await {
                Err(err) if err.is_retryable() => {
                    self.conflicts.fetch_add(1, Ordering::Relaxed);
                    if attempt >= self.max_retries {
                        warn!(operation, attempts = attempt + 1, error = %err, "Giving up after repeated version conflicts");
                        return Err(err);
                    }
                    attempt += 1;
                    warn!(operation, attempt, error = %err, "Version conflict, retrying");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                result => return result,
            }
        }
    }

    /// Searches one parent's entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The filter has an inverted date or amount range
    /// - The parent does not exist or is deleted
    /// - The caller does not own the parent
    /// - Database operation fails
    pub async fn search(
        &self,
        principal_id: UserId,
        parent_id: ParentId,
        filter: &EntryFilter,
    ) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        filter.validate()?;

        let parent = load_parent(&self.db, parent_id).await?;
        assert_live_owner(&parent, principal_id)?;

        debug!(%parent_id, ?filter, "Searching ledger entries");
        let models = in_search_order(apply_filter(
            ledger_entries::Entity::find()
                .filter(ledger_entries::Column::ParentId.eq(parent_id.into_inner())),
            filter,
        ))
        .all(&self.db)
        .await?;

        Ok(models.into_iter().map(LedgerEntry::from).collect())
    }

    /// Fetches entries for many parents at once, grouped by parent.
    ///
    /// Ids the caller cannot see (absent, deleted or owned by someone else)
    /// are left out of the result. Every visible id is present, with an
    /// empty vector when it has no entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn bulk_group_by_parent(
        &self,
        principal_id: UserId,
        parent_ids: &HashSet<ParentId>,
    ) -> Result<GroupedEntries, LedgerStoreError> {
        if parent_ids.is_empty() {
            return Ok(GroupedEntries::new());
        }

        let requested: Vec<Uuid> = parent_ids.iter().map(|id| id.into_inner()).collect();
        let visible: Vec<ParentId> = parents::Entity::find()
            .filter(parents::Column::Id.is_in(requested))
            .all(&self.db)
            .await?
            .into_iter()
            .map(Parent::from)
            .filter(|parent| is_visible_to(parent, principal_id))
            .map(|parent| parent.id)
            .collect();

        debug!(
            requested = parent_ids.len(),
            visible = visible.len(),
            "Resolved parents for bulk read"
        );
        if visible.is_empty() {
            return Ok(GroupedEntries::new());
        }

        let models = in_search_order(ledger_entries::Entity::find().filter(
            ledger_entries::Column::ParentId.is_in(visible.iter().map(|id| id.into_inner())),
        ))
        .all(&self.db)
        .await?;

        Ok(group_by_parent(
            visible,
            models.into_iter().map(LedgerEntry::from).collect(),
        ))
    }

    /// Recomputes a parent's balance from its entries and compares it with
    /// the stored balance.
    ///
    /// The parent is read before and after the entries; a version change in
    /// between means a writer committed mid-read and the read is repeated.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The parent does not exist or is deleted
    /// - The caller does not own the parent
    /// - Writers kept committing during every attempt
    /// - Database operation fails
    pub async fn reconcile(
        &self,
        principal_id: UserId,
        parent_id: ParentId,
    ) -> Result<BalanceReconciliation, LedgerStoreError> {
        let reconciliation = self
            .retry_on_conflict("reconcile", move || {
                self.try_reconcile(principal_id, parent_id)
            })
            .await?;

        if !reconciliation.is_consistent() {
            warn!(
                %parent_id,
                stored = reconciliation.stored,
                derived = reconciliation.derived,
                "Stored balance drifted from entry history"
            );
        }
        Ok(reconciliation)
    }

    async fn try_reconcile(
        &self,
        principal_id: UserId,
        parent_id: ParentId,
    ) -> Result<BalanceReconciliation, LedgerStoreError> {
        let parent = load_parent(&self.db, parent_id).await?;
        assert_live_owner(&parent, principal_id)?;

        let movements: Vec<(sea_orm_active_enums::EntryKind, i64)> =
            ledger_entries::Entity::find()
                .select_only()
                .column(ledger_entries::Column::Kind)
                .column(ledger_entries::Column::Amount)
                .filter(ledger_entries::Column::ParentId.eq(parent_id.into_inner()))
                .into_tuple()
                .all(&self.db)
                .await?;

        let after = load_parent(&self.db, parent_id).await?;
        if after.version != parent.version {
            return Err(LedgerError::ConcurrentModification(parent_id).into());
        }

        Ok(BalanceReconciliation::compute(
            &parent,
            movements.into_iter().map(|(kind, amount)| (kind.into(), amount)),
        ))
    }
}

/// Loads a parent row, deleted or not.
async fn load_parent<C: ConnectionTrait>(
    conn: &C,
    parent_id: ParentId,
) -> Result<Parent, LedgerStoreError> {
    let model = parents::Entity::find_by_id(parent_id.into_inner())
        .one(conn)
        .await?
        .ok_or(LedgerError::ParentNotFound(parent_id))?;
    Ok(model.into())
}

/// Writes a planned balance if the parent is still at the expected version
/// and not deleted.
///
/// # Errors
///
/// Returns `ConcurrentModification` when no row matched.
pub(crate) async fn write_balance<C: ConnectionTrait>(
    conn: &C,
    change: &BalanceChange,
) -> Result<(), LedgerStoreError> {
    let now: DateTimeWithTimeZone = normalize_timestamp(Utc::now()).into();

    let result = parents::Entity::update_many()
        .col_expr(parents::Column::Balance, Expr::value(change.new_balance))
        .col_expr(parents::Column::Version, Expr::value(change.next_version()))
        .col_expr(parents::Column::UpdatedAt, Expr::value(now))
        .filter(parents::Column::Id.eq(change.parent_id.into_inner()))
        .filter(parents::Column::Version.eq(change.expected_version))
        .filter(parents::Column::Deleted.eq(false))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(LedgerError::ConcurrentModification(change.parent_id).into());
    }
    Ok(())
}

/// Translates an `EntryFilter` into query conditions.
///
/// Date bounds are first aligned to stored precision so the query agrees
/// with `EntryFilter::matches`.
fn apply_filter(
    mut query: Select<ledger_entries::Entity>,
    filter: &EntryFilter,
) -> Select<ledger_entries::Entity> {
    let filter = filter.normalized();
    if let Some(kind) = filter.kind {
        query = query.filter(
            ledger_entries::Column::Kind.eq(sea_orm_active_enums::EntryKind::from(kind)),
        );
    }
    if let Some(from) = filter.date_from {
        let from: DateTimeWithTimeZone = from.into();
        query = query.filter(ledger_entries::Column::OccurredAt.gte(from));
    }
    if let Some(to) = filter.date_to {
        let to: DateTimeWithTimeZone = to.into();
        query = query.filter(ledger_entries::Column::OccurredAt.lte(to));
    }
    if let Some(min) = filter.min_amount {
        query = query.filter(ledger_entries::Column::Amount.gte(min));
    }
    if let Some(max) = filter.max_amount {
        query = query.filter(ledger_entries::Column::Amount.lte(max));
    }
    query
}

fn in_search_order(query: Select<ledger_entries::Entity>) -> Select<ledger_entries::Entity> {
    query
        .order_by_desc(ledger_entries::Column::OccurredAt)
        .order_by_desc(ledger_entries::Column::Id)
}
