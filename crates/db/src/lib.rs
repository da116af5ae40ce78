//! Database layer with `SeaORM` entities and the movement store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for movements, lines and tasks
//! - `SeaOrmMovementStore`, the version-guarded movement store
//! - Database migrations

#[allow(missing_docs)]
pub mod entities;
pub mod migration;
pub mod store;

pub use store::SeaOrmMovementStore;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use stockflow_shared::config::DatabaseConfig;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the configured pool limits.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .sqlx_logging(false);
    Database::connect(options).await
}
