//! Expiry sweep worker.
//!
//! Every `sweeper.interval_secs` it flips past-dated batches to expired for
//! every business that has any, and recomputes the affected product stock.
//! Each business is swept in its own transaction, so the worker can run
//! alongside live traffic. `--once` runs a single sweep and exits.

use std::time::Duration;

use anyhow::Context;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use backoffice_db::{Operations, connect};
use backoffice_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = connect(&config.database).await.context("failed to connect to database")?;
    let ops = Operations::new(db, &config);

    if std::env::args().any(|a| a == "--once") {
        sweep(&ops).await;
        return Ok(());
    }

    let period = Duration::from_secs(config.sweeper.interval_secs.max(1));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = period.as_secs(), "Expiry sweeper started");

    loop {
        tokio::select! {
            _ = ticker.tick() => sweep(&ops).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Expiry sweeper stopping");
                return Ok(());
            }
        }
    }
}

async fn sweep(ops: &Operations) {
    match ops.sweep_all_expired().await {
        Ok(swept) if swept.is_empty() => info!("No expired batches"),
        Ok(swept) => {
            let batches: usize = swept.iter().map(|(_, s)| s.expired_batches.len()).sum();
            info!(businesses = swept.len(), batches, "Expired batches deactivated");
        }
        Err(err) => warn!(error = %err, "Expiry sweep failed, will retry next tick"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "sweeper=info,backoffice_db=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
