//! Chart-of-accounts routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use backoffice_core::ledger::{AccountPatch, AccountType};
use backoffice_db::repositories::CreateAccountInput;
use backoffice_shared::types::AccountId;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{ActorContext, AppState, error::ApiError};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{account_id}", patch(update_account))
        .route("/accounts/default-chart", post(seed_default_chart))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account code, unique within the business.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account classification.
    #[serde(rename = "type")]
    pub account_type: AccountType,
}

/// GET `/accounts`
async fn list_accounts(State(state): State<AppState>, ctx: ActorContext) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.ops.list_accounts(ctx.business_id).await?;
    Ok(Json(json!({ "accounts": accounts })))
}

/// POST `/accounts`
async fn create_account(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state
        .ops
        .create_account(
            ctx.business_id,
            CreateAccountInput {
                code: payload.code,
                name: payload.name,
                account_type: payload.account_type,
                is_system: false,
            },
        )
        .await?;

    info!(business_id = %ctx.business_id, account_id = %account.id, code = %account.code, "Account created");
    Ok((StatusCode::CREATED, Json(account)))
}

/// PATCH `/accounts/{account_id}`
async fn update_account(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(account_id): Path<AccountId>,
    Json(patch): Json<AccountPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.ops.update_account(ctx.business_id, account_id, patch).await?;
    Ok(Json(account))
}

/// POST `/accounts/default-chart` - Idempotent onboarding of the system accounts.
async fn seed_default_chart(
    State(state): State<AppState>,
    ctx: ActorContext,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.ops.seed_default_chart(ctx.business_id).await?;
    Ok(Json(json!({ "accounts": accounts })))
}
