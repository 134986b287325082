//! Stock allocation, movement and batch routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{patch, post},
};
use backoffice_core::inventory::{
    AllocationStrategy, BatchPatch, MovementType, NewBatchFields, TransactionType,
};
use backoffice_db::repositories::{NewMovement, ReceiveBatchInput, StockReference};
use backoffice_shared::types::{BatchId, CustomerId, InvoiceId, ProductId, VariantId, WarehouseId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use crate::{ActorContext, AppState, error::ApiError};

/// Creates the inventory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/inventory/allocations", post(allocate))
        .route("/inventory/consumptions", post(consume))
        .route("/inventory/movements", post(record_movement))
        .route("/inventory/batches", post(receive_batch))
        .route("/inventory/batches/{batch_id}", patch(update_batch))
        .route("/inventory/batches/{batch_id}/reserve", post(reserve_batch))
        .route("/inventory/batches/{batch_id}/release", post(release_batch))
        .route("/inventory/expiry-sweep", post(expiry_sweep))
        .route("/inventory/products/{product_id}/reconcile", post(reconcile_product))
        .route("/inventory/serials/{serial_number}/sell", post(sell_serial))
}

/// Request body for planning or consuming stock.
#[derive(Debug, Deserialize)]
pub struct AllocationRequestBody {
    /// Product to draw from.
    pub product_id: ProductId,
    /// Quantity to cover exactly.
    pub quantity: Decimal,
    /// Restrict to one warehouse.
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    /// `fefo` (default) or `fifo`.
    #[serde(default)]
    pub strategy: AllocationStrategy,
    /// Source of the consumption. Ignored when only planning.
    #[serde(default)]
    pub reference: Option<StockReference>,
}

/// Request body for a raw stock movement.
#[derive(Debug, Deserialize)]
pub struct MovementRequest {
    /// Product whose stock changes.
    pub product_id: ProductId,
    /// Variant whose stock changes too.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Batch the movement belongs to.
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    /// Signed quantity.
    pub quantity_change: Decimal,
    /// Explicit type; derived from the sign when absent.
    #[serde(default)]
    pub movement_type: Option<MovementType>,
    /// Unit cost of the goods moved.
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    /// Why the stock moved.
    pub reference: StockReference,
}

/// Request body for receiving a batch.
#[derive(Debug, Deserialize)]
pub struct ReceiveBatchRequest {
    /// Product received.
    pub product_id: ProductId,
    /// Supplier or internal lot number.
    pub batch_number: String,
    /// Quantity received.
    pub quantity: Decimal,
    /// Unit cost.
    pub cost_price: Decimal,
    /// Maximum retail price.
    #[serde(default)]
    pub mrp: Decimal,
    /// Expiry date.
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    /// Manufacturing date.
    #[serde(default)]
    pub manufacturing_date: Option<NaiveDate>,
    /// Receiving warehouse.
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
}

/// Request body for reserve and release.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    /// Quantity to reserve or release.
    pub quantity: Decimal,
}

/// Request body for selling a serialized unit.
#[derive(Debug, Default, Deserialize)]
pub struct SellSerialRequest {
    /// Buyer.
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    /// Invoice the unit was sold on.
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
}

/// POST `/inventory/allocations` - Plan only; nothing is decremented.
async fn allocate(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<AllocationRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = state
        .ops
        .allocate_stock(
            ctx.business_id,
            payload.product_id,
            payload.quantity,
            payload.warehouse_id,
            payload.strategy,
        )
        .await?;
    Ok(Json(plan))
}

/// POST `/inventory/consumptions` - Plan and decrement in one unit of work.
async fn consume(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<AllocationRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let mut reference = payload
        .reference
        .unwrap_or_else(|| StockReference::new(TransactionType::Sale));
    reference.actor_id = Some(ctx.actor_id);

    let consumed = state
        .ops
        .consume_stock(
            ctx.business_id,
            payload.product_id,
            payload.quantity,
            payload.warehouse_id,
            payload.strategy,
            reference,
        )
        .await?;

    info!(
        business_id = %ctx.business_id,
        product_id = %payload.product_id,
        quantity = %payload.quantity,
        batches = consumed.plan.lines.len(),
        "Stock consumed"
    );
    Ok(Json(consumed))
}

/// POST `/inventory/movements`
async fn record_movement(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<MovementRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut reference = payload.reference;
    reference.actor_id = Some(ctx.actor_id);

    let movement = state
        .ops
        .record_stock_movement(NewMovement {
            business_id: ctx.business_id,
            product_id: payload.product_id,
            variant_id: payload.variant_id,
            batch_id: payload.batch_id,
            quantity_change: payload.quantity_change,
            movement_type: payload.movement_type,
            unit_cost: payload.unit_cost,
            reference,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// POST `/inventory/batches`
async fn receive_batch(
    State(state): State<AppState>,
    ctx: ActorContext,
    Json(payload): Json<ReceiveBatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state
        .ops
        .receive_batch(ReceiveBatchInput {
            business_id: ctx.business_id,
            product_id: payload.product_id,
            batch_number: payload.batch_number,
            fields: NewBatchFields {
                quantity: payload.quantity,
                cost_price: payload.cost_price,
                mrp: payload.mrp,
                expiry_date: payload.expiry_date,
                manufacturing_date: payload.manufacturing_date,
            },
            warehouse_id: payload.warehouse_id,
            actor_id: Some(ctx.actor_id),
        })
        .await?;

    info!(business_id = %ctx.business_id, batch_id = %batch.id, "Batch received");
    Ok((StatusCode::CREATED, Json(batch)))
}

/// PATCH `/inventory/batches/{batch_id}` - Quantities are not editable here.
async fn update_batch(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(batch_id): Path<BatchId>,
    Json(patch): Json<BatchPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state.ops.update_batch(ctx.business_id, batch_id, patch).await?;
    Ok(Json(batch))
}

/// POST `/inventory/batches/{batch_id}/reserve`
async fn reserve_batch(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(batch_id): Path<BatchId>,
    Json(payload): Json<QuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state
        .ops
        .reserve_batch(ctx.business_id, batch_id, payload.quantity)
        .await?;
    Ok(Json(batch))
}

/// POST `/inventory/batches/{batch_id}/release`
async fn release_batch(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(batch_id): Path<BatchId>,
    Json(payload): Json<QuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let batch = state
        .ops
        .release_batch(ctx.business_id, batch_id, payload.quantity)
        .await?;
    Ok(Json(batch))
}

/// POST `/inventory/expiry-sweep` - Expire past-dated batches for this business.
async fn expiry_sweep(State(state): State<AppState>, ctx: ActorContext) -> Result<impl IntoResponse, ApiError> {
    let sweep = state.ops.deactivate_expired(ctx.business_id).await?;
    Ok(Json(sweep))
}

/// POST `/inventory/products/{product_id}/reconcile`
async fn reconcile_product(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse, ApiError> {
    let drift = state
        .ops
        .reconcile_product_stock(ctx.business_id, product_id)
        .await?;
    Ok(Json(drift))
}

/// POST `/inventory/serials/{serial_number}/sell`
async fn sell_serial(
    State(state): State<AppState>,
    ctx: ActorContext,
    Path(serial_number): Path<String>,
    Json(payload): Json<SellSerialRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let unit = state
        .ops
        .sell_serial_unit(ctx.business_id, &serial_number, payload.customer_id, payload.invoice_id)
        .await?;
    Ok(Json(unit))
}
