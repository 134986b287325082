//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories taking an explicit connection or transaction handle
//! - The unit of work and the [`Operations`] facade built on it
//! - Database migrations

pub mod entities;
pub mod error;
pub mod migration;
pub mod operations;
pub mod repositories;
pub mod unit_of_work;

pub use error::StoreError;
pub use operations::Operations;
pub use unit_of_work::UnitOfWork;

use std::time::Duration;

use backoffice_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a pooled connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(8))
        .sqlx_logging(false);

    Database::connect(options).await
}
