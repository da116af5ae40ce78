//! Database seeder for Stockflow development and testing.
//!
//! Applies the migrations and then drives a set of demo movements through the
//! engine against the configured database, so the stored rows are exactly
//! what the engine would write in production.
//!
//! Usage: cargo run --bin seeder

mod catalog;

use std::sync::Arc;

use anyhow::Context;
use rust_decimal_macros::dec;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use stockflow_core::movement::{
    CachedLocationDirectory, Collaborators, EngineConfig, LineAction, MovementAction,
    MovementEngine, MovementError, MovementFilter, MovementType, NewMovement, NewMovementLine,
    TaskAction, TaskActionInput,
};
use stockflow_db::SeaOrmMovementStore;
use stockflow_db::migration::{Migrator, MigratorTrait};
use stockflow_shared::AppConfig;
use stockflow_shared::config::{LogFormat, LoggingConfig};
use stockflow_shared::types::{LocationId, PageRequest, UserId};

use catalog::{Catalog, Ledger};

type Engine = MovementEngine<SeaOrmMovementStore>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    let db = stockflow_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    Migrator::up(&db, None).await.context("Failed to run migrations")?;
    info!("Database ready");

    let engine_config = EngineConfig::from(&config.engine);
    let catalog = Arc::new(Catalog::demo());
    let ledger = Arc::new(Ledger::default());
    let collaborators = Collaborators {
        locations: Arc::new(CachedLocationDirectory::new(
            catalog.clone(),
            engine_config.directory_cache_capacity,
            engine_config.directory_cache_ttl,
        )),
        items: catalog.clone(),
        stock: ledger.clone(),
        inventory: ledger.clone(),
    };
    let engine = MovementEngine::new(
        Arc::new(SeaOrmMovementStore::new(db)),
        collaborators,
        engine_config,
    );

    seed_receipt(&engine, &catalog).await?;
    seed_transfer(&engine, &catalog, &ledger).await?;
    seed_short_issue(&engine, &catalog).await?;
    seed_discarded_draft(&engine, &catalog).await?;

    let page = engine
        .list(
            &MovementFilter {
                warehouse_id: Some(catalog.warehouse.id),
                ..MovementFilter::default()
            },
            PageRequest::default(),
        )
        .await?;
    for summary in &page.data {
        info!(
            movement_id = %summary.id,
            movement_type = %summary.movement_type,
            status = %summary.status,
            progress = summary.progress_percent,
            "Seeded movement"
        );
    }
    info!(total = page.meta.total, "Seeding complete");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn location(catalog: &Catalog, code: &str) -> anyhow::Result<LocationId> {
    catalog
        .location(code)
        .with_context(|| format!("demo location {code} missing"))
}

/// Receipt at the inbound dock, worked through its suggested tasks.
async fn seed_receipt(engine: &Engine, catalog: &Catalog) -> anyhow::Result<()> {
    let dock = location(catalog, "DOCK-IN")?;
    let wrap = catalog.item("SKU-1001").context("demo item missing")?;
    let bolts = catalog.item("SKU-2040").context("demo item missing")?;

    let draft = NewMovement::new(MovementType::Receipt, catalog.warehouse.id)
        .to_location(dock)
        .reference("PO-2026-0042")
        .line(NewMovementLine::new(wrap.id, dec!(120)).unit(wrap.default_unit))
        .line(NewMovementLine::new(bolts.id, dec!(40)).unit(bolts.default_unit))
        .with_suggested_tasks()
        .pending();
    let movement = engine.create_movement(draft).await?.movement;
    engine
        .transition(movement.id, MovementAction::Start, None)
        .await?;

    let worker = UserId::new();
    for task in &movement.tasks {
        engine
            .transition_task(
                task.id,
                TaskAction::Assign,
                TaskActionInput {
                    user_id: Some(worker),
                    ..TaskActionInput::default()
                },
            )
            .await?;
        engine
            .transition_task(task.id, TaskAction::Start, TaskActionInput::default())
            .await?;
        engine
            .transition_task(task.id, TaskAction::Complete, TaskActionInput::default())
            .await?;
    }
    for line in &movement.lines {
        engine.transition_line(line.id, LineAction::Complete).await?;
    }

    engine
        .transition(movement.id, MovementAction::Complete, None)
        .await?;
    Ok(())
}

/// Transfer between aisles, paused once on the way and picked short.
async fn seed_transfer(engine: &Engine, catalog: &Catalog, ledger: &Ledger) -> anyhow::Result<()> {
    let from = location(catalog, "A-01-01")?;
    let to = location(catalog, "A-02-01")?;
    let oil = catalog.item("SKU-3300").context("demo item missing")?;
    ledger.receive(oil.id, from, dec!(500));

    let draft = NewMovement::new(MovementType::Transfer, catalog.warehouse.id)
        .from_location(from)
        .to_location(to)
        .line(NewMovementLine::new(oil.id, dec!(200)).unit(oil.default_unit))
        .pending();
    let created = engine.create_movement(draft).await?;
    let id = created.movement.id;

    engine.transition(id, MovementAction::Start, None).await?;
    engine
        .transition(id, MovementAction::Hold, Some("Forklift out of service".into()))
        .await?;
    engine.transition(id, MovementAction::Release, None).await?;
    for line in &created.movement.lines {
        engine.transition_line(line.id, LineAction::Pick).await?;
        engine.correct_line_quantity(line.id, dec!(190)).await?;
        engine.transition_line(line.id, LineAction::Ship).await?;
        engine.transition_line(line.id, LineAction::Complete).await?;
    }
    engine.transition(id, MovementAction::Complete, None).await?;

    info!(
        source = %ledger.balance(oil.id, from),
        destination = %ledger.balance(oil.id, to),
        "Transfer booked"
    );
    Ok(())
}

/// Issue that asks for more than is on hand and is refused.
async fn seed_short_issue(engine: &Engine, catalog: &Catalog) -> anyhow::Result<()> {
    let shelf = location(catalog, "A-02-01")?;
    let bolts = catalog.item("SKU-2040").context("demo item missing")?;

    let draft = NewMovement::new(MovementType::Issue, catalog.warehouse.id)
        .from_location(shelf)
        .reference("SO-9001")
        .line(NewMovementLine::new(bolts.id, dec!(10000)));
    match engine.create_movement(draft).await {
        Err(err @ MovementError::InsufficientStock { .. }) => {
            warn!(error = %err, "Issue refused as expected");
            Ok(())
        }
        Err(err) => Err(err.into()),
        Ok(created) => anyhow::bail!("issue {} unexpectedly accepted", created.movement.id),
    }
}

/// A draft adjustment that is created and then thrown away.
async fn seed_discarded_draft(engine: &Engine, catalog: &Catalog) -> anyhow::Result<()> {
    let shelf = location(catalog, "A-01-01")?;
    let wrap = catalog.item("SKU-1001").context("demo item missing")?;

    let draft = NewMovement::new(MovementType::Adjustment, catalog.warehouse.id)
        .to_location(shelf)
        .line(NewMovementLine::new(wrap.id, dec!(3)));
    let movement = engine.create_movement(draft).await?.movement;
    engine.delete_movement(movement.id).await?;
    Ok(())
}
