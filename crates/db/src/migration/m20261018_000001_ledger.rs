//! Ledger schema migration.
//!
//! Creates the parents and ledger_entries tables. The SQL sticks to types
//! and constraints that Postgres and SQLite both accept, so the same
//! migration backs production and the in-memory test databases.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for statement in UP_SQL {
            db.execute_unprepared(statement).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS ledger_entries;")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS parents;").await?;
        Ok(())
    }
}

const UP_SQL: [&str; 5] = [
    PARENTS_SQL,
    PARENTS_OWNER_INDEX_SQL,
    LEDGER_ENTRIES_SQL,
    LEDGER_ENTRIES_ORDER_INDEX_SQL,
    LEDGER_ENTRIES_KIND_INDEX_SQL,
];

const PARENTS_SQL: &str = r"
-- Accounts and assets: stored balance plus the optimistic version counter
CREATE TABLE parents (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL,
    kind VARCHAR(16) NOT NULL,
    name VARCHAR(255) NOT NULL,
    balance BIGINT NOT NULL,
    initial_balance BIGINT NOT NULL,
    version BIGINT NOT NULL DEFAULT 0,
    deleted BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_parents_kind CHECK (kind IN ('account', 'asset')),
    CONSTRAINT chk_parents_balance CHECK (balance >= 0),
    CONSTRAINT chk_parents_initial_balance CHECK (initial_balance >= 0),
    CONSTRAINT chk_parents_version CHECK (version >= 0)
);
";

const PARENTS_OWNER_INDEX_SQL: &str = r"
-- Owner listing skips soft-deleted rows
CREATE INDEX idx_parents_owner ON parents(owner_id, kind) WHERE deleted = FALSE;
";

const LEDGER_ENTRIES_SQL: &str = r"
-- Ledger entries: append-only except for reversal
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    parent_id UUID NOT NULL REFERENCES parents(id),
    kind VARCHAR(16) NOT NULL,
    amount BIGINT NOT NULL,
    memo VARCHAR(255) NOT NULL DEFAULT '',
    occurred_at TIMESTAMPTZ NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_ledger_entries_kind CHECK (kind IN ('credit', 'debit')),
    CONSTRAINT chk_ledger_entries_amount CHECK (amount > 0)
);
";

const LEDGER_ENTRIES_ORDER_INDEX_SQL: &str = r"
-- Search order: newest first, id breaks ties
CREATE INDEX idx_ledger_entries_parent_order ON ledger_entries(parent_id, occurred_at DESC, id DESC);
";

const LEDGER_ENTRIES_KIND_INDEX_SQL: &str = r"
CREATE INDEX idx_ledger_entries_parent_kind ON ledger_entries(parent_id, kind);
";
