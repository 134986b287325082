//! Fiscal period routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use backoffice_shared::types::FiscalPeriodId;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{ActorContext, AppState, error::ApiError};

/// Creates the fiscal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/fiscal-periods", get(list_periods).post(create_period))
        .route("/fiscal-periods/{period_id}/close", post(close_period))
        .route("/fiscal-periods/{period_id}/reopen", post(reopen_period))
        .route("/fiscal-periods/{period_id}/lock", post(lock_period))
}

/// Request body for creating a fiscal period.
#[derive(Debug, Deserialize)]
pub struct CreatePeriodRequest {
    /// Period name (e.g., "FY2024 Q1").
    pub name: String,
    /// Start date (YYYY-MM-DD).
    pub start_date: NaiveDate,
    /// End date, inclusive (YYYY-MM-DD).
    pub end_date: NaiveDate,
}

/// GET `/fiscal-periods`
async fn list_periods(State(state): State<AppState>, ctx: ActorContext) -> Result<impl IntoResponse, ApiError> {
    let periods = state.ops.list_fiscal_periods(ctx.business_id).await?;
    Ok(Json(json!({ "fiscal_periods": periods })))
}

/// POST `/fiscal-periods`
async fn create_period(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<CreatePeriodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let period = state
        .ops
        .create_fiscal_period(ctx.business_id, &payload.name, payload.start_date, payload.end_date)
        .await?;

    info!(business_id = %ctx.business_id, period_id = %period.id, "Fiscal period created");
    Ok((StatusCode::CREATED, Json(period)))
}

/// POST `/fiscal-periods/{period_id}/close` - Requires a balanced trial balance.
async fn close_period(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(period_id): Path<FiscalPeriodId>,
) -> Result<impl IntoResponse, ApiError> {
    let period = state
        .ops
        .close_fiscal_period(ctx.business_id, period_id, ctx.actor_id)
        .await?;
    info!(business_id = %ctx.business_id, period_id = %period_id, "Fiscal period closed");
    Ok(Json(period))
}

/// POST `/fiscal-periods/{period_id}/reopen`
async fn reopen_period(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(period_id): Path<FiscalPeriodId>,
) -> Result<impl IntoResponse, ApiError> {
    let period = state.ops.reopen_fiscal_period(ctx.business_id, period_id).await?;
    info!(business_id = %ctx.business_id, period_id = %period_id, "Fiscal period reopened");
    Ok(Json(period))
}

/// POST `/fiscal-periods/{period_id}/lock`
async fn lock_period(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(period_id): Path<FiscalPeriodId>,
) -> Result<impl IntoResponse, ApiError> {
    let period = state
        .ops
        .lock_fiscal_period(ctx.business_id, period_id, ctx.actor_id)
        .await?;
    info!(business_id = %ctx.business_id, period_id = %period_id, "Fiscal period locked");
    Ok(Json(period))
}
