//! Schema migration runner.
//!
//! ```text
//! migrator [up]   apply pending migrations (default)
//! migrator down   roll back the most recent migration
//! migrator status list applied and pending migrations
//! migrator fresh  drop everything and re-apply (development only)
//! ```
//!
//! The database URL comes from the same configuration as the server.

use anyhow::{Context, bail};
use backoffice_db::connect;
use backoffice_db::migration::Migrator;
use backoffice_shared::AppConfig;
use sea_orm_migration::MigratorTrait;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = connect(&config.database).await.context("failed to connect to database")?;

    match command.as_str() {
        "up" => Migrator::up(&db, None).await?,
        "down" => Migrator::down(&db, Some(1)).await?,
        "status" => Migrator::status(&db).await?,
        "fresh" => Migrator::fresh(&db).await?,
        other => bail!("unknown command `{other}`, expected up, down, status or fresh"),
    }

    info!(command = %command, "migrator finished");
    Ok(())
}
