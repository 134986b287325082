//! General ledger posting routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use backoffice_core::ledger::{GlLineInput, PostingRequest};
use backoffice_shared::types::GlBatchId;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{ActorContext, AppState, error::ApiError};

/// Creates the ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledger/entries", post(post_entry))
        .route("/ledger/batches/{batch_id}/verify", get(verify_batch))
}

/// Request body for posting a batch of lines.
#[derive(Debug, Deserialize)]
pub struct PostEntryRequest {
    /// Accounting date (YYYY-MM-DD).
    pub transaction_date: NaiveDate,
    /// Description copied onto every line.
    pub description: String,
    /// Source document type.
    pub reference_type: String,
    /// Source document ID.
    #[serde(default)]
    pub reference_id: Option<Uuid>,
    /// Debit and credit lines.
    pub lines: Vec<GlLineInput>,
}

/// POST `/ledger/entries`
async fn post_entry(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<PostEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let posted = state
        .ops
        .post_ledger_entry(PostingRequest {
            business_id: ctx.business_id,
            transaction_date: payload.transaction_date,
            description: payload.description,
            reference_type: payload.reference_type,
            reference_id: payload.reference_id,
            actor_id: ctx.actor_id,
            lines: payload.lines,
        })
        .await?;

    info!(
        business_id = %ctx.business_id,
        batch_id = %posted.batch_id,
        lines = posted.lines.len(),
        "Ledger batch posted"
    );
    Ok((StatusCode::CREATED, Json(posted)))
}

/// GET `/ledger/batches/{batch_id}/verify` - Recompute a batch's totals.
async fn verify_batch(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(batch_id): Path<GlBatchId>,
) -> Result<impl IntoResponse, ApiError> {
    let totals = state.ops.verify_batch(ctx.business_id, batch_id).await?;
    Ok(Json(totals))
}
