//! Credit note and refund routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use backoffice_core::reversal::{RefundMethod, ReversalLineInput};
use backoffice_db::repositories::{IssueCreditNoteInput, IssueRefundInput};
use backoffice_shared::types::{CreditNoteId, InvoiceId, PosTransactionId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::today;
use crate::{ActorContext, AppState, error::ApiError};

/// Creates the reversal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/credit-notes", post(issue_credit_note))
        .route("/credit-notes/{credit_note_id}/apply", post(apply_credit_note))
        .route("/credit-notes/{credit_note_id}/cancel", post(cancel_credit_note))
        .route("/refunds", post(issue_refund))
}

/// Request body for issuing a credit note.
#[derive(Debug, Deserialize)]
pub struct IssueCreditNoteRequest {
    /// Invoice being reversed.
    pub invoice_id: InvoiceId,
    /// Returned lines.
    pub items: Vec<ReversalLineInput>,
    /// Reason shown on the document.
    #[serde(default)]
    pub reason: Option<String>,
    /// Accounting date. Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Request body for issuing a refund.
#[derive(Debug, Deserialize)]
pub struct IssueRefundRequest {
    /// POS transaction being refunded.
    pub transaction_id: PosTransactionId,
    /// Returned lines.
    pub items: Vec<ReversalLineInput>,
    /// `cash`, `bank` or `card`.
    pub refund_method: RefundMethod,
    /// Reason shown on the document.
    #[serde(default)]
    pub reason: Option<String>,
    /// Accounting date. Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Request body for applying a credit note.
#[derive(Debug, Deserialize)]
pub struct ApplyCreditNoteRequest {
    /// Invoice to settle.
    pub invoice_id: InvoiceId,
    /// Amount to apply; the whole note when absent.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// POST `/credit-notes`
async fn issue_credit_note(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<IssueCreditNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state
        .ops
        .issue_credit_note(IssueCreditNoteInput {
            business_id: ctx.business_id,
            invoice_id: payload.invoice_id,
            items: payload.items,
            reason: payload.reason,
            actor_id: ctx.actor_id,
            date: payload.date.unwrap_or_else(today),
        })
        .await?;

    info!(
        business_id = %ctx.business_id,
        credit_note = %issued.credit_note.credit_note_number,
        total = %issued.credit_note.total_amount,
        "Credit note issued"
    );
    Ok((StatusCode::CREATED, Json(issued)))
}

/// POST `/credit-notes/{credit_note_id}/apply`
async fn apply_credit_note(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(credit_note_id): Path<CreditNoteId>,
    Json(payload): Json<ApplyCreditNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let applied = state
        .ops
        .apply_credit_note(ctx.business_id, credit_note_id, payload.invoice_id, payload.amount)
        .await?;
    Ok(Json(applied))
}

/// POST `/credit-notes/{credit_note_id}/cancel`
async fn cancel_credit_note(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(credit_note_id): Path<CreditNoteId>,
) -> Result<impl IntoResponse, ApiError> {
    let cancelled = state
        .ops
        .cancel_credit_note(ctx.business_id, credit_note_id, ctx.actor_id)
        .await?;
    info!(business_id = %ctx.business_id, credit_note_id = %credit_note_id, "Credit note cancelled");
    Ok(Json(cancelled))
}

/// POST `/refunds`
async fn issue_refund(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<IssueRefundRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let issued = state
        .ops
        .issue_refund(IssueRefundInput {
            business_id: ctx.business_id,
            transaction_id: payload.transaction_id,
            items: payload.items,
            refund_method: payload.refund_method,
            reason: payload.reason,
            actor_id: ctx.actor_id,
            date: payload.date.unwrap_or_else(today),
        })
        .await?;

    info!(
        business_id = %ctx.business_id,
        refund = %issued.refund.refund_number,
        status = ?issued.transaction_status,
        "Refund issued"
    );
    Ok((StatusCode::CREATED, Json(issued)))
}
