//! Shared setup for repository integration tests.
//!
//! Each test gets its own in-memory SQLite database with the real
//! migration applied.

#![allow(dead_code)]

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::{MigrationTrait, MigratorTrait, SchemaManager};

use tally_core::ledger::{Parent, ParentKind};
use tally_db::migration::Migrator;
use tally_db::{CreateParentInput, LedgerRepository, ParentRepository};
use tally_shared::LedgerConfig;
use tally_shared::types::UserId;

/// Repositories over one fresh database.
pub struct TestContext {
    pub db: DatabaseConnection,
    pub parents: ParentRepository,
    pub ledger: LedgerRepository,
}

/// Opens a fresh database and runs the migrations.
pub async fn setup() -> TestContext {
    setup_with(&LedgerConfig {
        max_retries: 10,
        retry_backoff_ms: 1,
    })
    .await
}

/// Same as `setup`, with the given retry settings for the ledger.
pub async fn setup_with(config: &LedgerConfig) -> TestContext {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");

    let manager = SchemaManager::new(&db);
    for migration in Migrator::migrations() {
        migration
            .up(&manager)
            .await
            .expect("Failed to apply migration");
    }

    TestContext {
        parents: ParentRepository::new(db.clone()),
        ledger: LedgerRepository::with_config(db.clone(), config),
        db,
    }
}

impl TestContext {
    /// Creates an account owned by `owner`.
    pub async fn account(&self, owner: UserId, initial_balance: i64) -> Parent {
        self.parent(owner, ParentKind::Account, "Checking", initial_balance)
            .await
    }

    /// Creates an asset owned by `owner`.
    pub async fn asset(&self, owner: UserId, initial_balance: i64) -> Parent {
        self.parent(owner, ParentKind::Asset, "Gold", initial_balance)
            .await
    }

    pub async fn parent(
        &self,
        owner: UserId,
        kind: ParentKind,
        name: &str,
        initial_balance: i64,
    ) -> Parent {
        self.parents
            .create_parent(CreateParentInput {
                owner_id: owner,
                kind,
                name: name.to_string(),
                initial_balance,
            })
            .await
            .expect("Failed to create parent")
    }

    /// Reloads a parent straight from the store.
    pub async fn reload(&self, parent: &Parent) -> Parent {
        self.parents
            .find_parent(parent.id)
            .await
            .expect("Failed to load parent")
            .expect("Parent missing")
    }
}
