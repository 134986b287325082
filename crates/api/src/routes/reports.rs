//! Report routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::today;
use crate::{ActorContext, AppState, error::ApiError};

/// Creates the report routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/reports/trial-balance", get(trial_balance))
}

/// Query parameters for the trial balance.
#[derive(Debug, Deserialize)]
pub struct TrialBalanceQuery {
    /// Include entries dated on or before this day. Defaults to today.
    pub as_of: Option<NaiveDate>,
    /// Only include entries dated on or after this day.
    pub from: Option<NaiveDate>,
}

/// GET `/reports/trial-balance?as_of=YYYY-MM-DD[&from=YYYY-MM-DD]`
async fn trial_balance(
    State(state): State<AppState>,
    ctx: ActorContext,
    Query(query): Query<TrialBalanceQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let as_of = query.as_of.unwrap_or_else(today);
    let report = match query.from {
        Some(from) => state.ops.trial_balance_range(ctx.business_id, from, as_of).await?,
        None => state.ops.trial_balance(ctx.business_id, as_of).await?,
    };
    Ok(Json(report))
}
