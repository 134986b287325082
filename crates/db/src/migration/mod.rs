//! Database migrations.
//!
//! Schema changes are raw SQL run through sea-orm-migration. The migrator
//! binary and the integration tests both drive [`Migrator`].

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_backoffice_core;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_000001_backoffice_core::Migration)]
    }
}
