//! Database seeder for Tally development and testing.
//!
//! Creates a demo owner's account and asset, then replays a short salary
//! month through the ledger so a fresh database has history to query.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use chrono::{Duration, Utc};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::ledger::{EntryFilter, NewEntry, ParentKind};
use tally_db::{CreateParentInput, LedgerRepository, ParentRepository};
use tally_shared::AppConfig;
use tally_shared::types::UserId;

/// Demo owner (consistent for all seeds)
const DEMO_OWNER_ID: &str = "00000000-0000-0000-0000-000000000002";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    info!("Connecting to database...");
    let db = tally_db::connect_with_config(&config.database)
        .await
        .context("Failed to connect to database")?;

    let parents = ParentRepository::new(db.clone());
    let ledger = LedgerRepository::with_config(db, &config.ledger);
    let owner: UserId = DEMO_OWNER_ID.parse().context("Invalid demo owner id")?;

    info!("Seeding parents...");
    let checking = parents
        .create_parent(CreateParentInput {
            owner_id: owner,
            kind: ParentKind::Account,
            name: "Checking".to_string(),
            initial_balance: 10_000,
        })
        .await?;
    let gold = parents
        .create_parent(CreateParentInput {
            owner_id: owner,
            kind: ParentKind::Asset,
            name: "Gold coins".to_string(),
            initial_balance: 3,
        })
        .await?;

    info!("Replaying salary month...");
    let start = Utc::now() - Duration::days(30);

    let salary = NewEntry::credit(checking.id, 500, "salary", start);
    ledger.apply(owner, salary).await?;

    let rent = NewEntry::debit(checking.id, 20_000, "rent", start + Duration::days(1));
    match ledger.apply(owner, rent).await {
        Ok(_) => anyhow::bail!("Uncovered debit was accepted"),
        Err(err) => warn!(error = %err, "Rent debit rejected as expected"),
    }

    let groceries = NewEntry::debit(checking.id, 3_000, "groceries", start + Duration::days(2));
    let groceries = ledger.apply(owner, groceries).await?;
    ledger.reverse(owner, groceries.id).await?;

    ledger
        .apply(owner, NewEntry::credit(gold.id, 2, "bought two coins", start + Duration::days(3)))
        .await?;

    for parent in [checking.id, gold.id] {
        let entries = ledger.search(owner, parent, &EntryFilter::new()).await?;
        let report = ledger.reconcile(owner, parent).await?;
        info!(
            %parent,
            entries = entries.len(),
            balance = report.stored,
            consistent = report.is_consistent(),
            "Seeded parent"
        );
    }

    info!("Seeding complete!");
    Ok(())
}
