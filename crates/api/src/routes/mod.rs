//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod accounts;
pub mod fiscal;
pub mod health;
pub mod inventory;
pub mod ledger;
pub mod reports;
pub mod reversals;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(ledger::routes())
        .merge(fiscal::routes())
        .merge(reports::routes())
        .merge(inventory::routes())
        .merge(reversals::routes())
}

/// Business date used when a request does not name one.
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
