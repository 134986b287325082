//! Inventory repository: lot allocation, stock movements, reservations and
//! expiry.
//!
//! Batches are only ever decremented through conditional updates that
//! re-check availability at write time; a lost race surfaces as
//! `AllocationConflict` and the caller retries the whole unit of work.

use std::collections::BTreeSet;

use backoffice_core::inventory::{
    AllocationPlan, AllocationRequest, BatchCandidate, BatchLevel, BatchPatch, InventoryError,
    LotAllocator, MovementType, NewBatchFields, StockDrift, StockRules, TransactionType,
};
use backoffice_shared::types::{
    BatchId, BusinessId, CustomerId, InvoiceId, ProductId, SerialUnitId, StockMovementId, UserId,
    VariantId, WarehouseId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{
    batches, product_variants, products,
    sea_orm_active_enums::{BatchStatus, SerialStatus},
    serial_units, stock_movements,
};
use crate::error::StoreError;

/// Why stock moved and who moved it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReference {
    /// Business transaction behind the movement.
    pub transaction_type: TransactionType,
    /// Source document type, e.g. `invoice`.
    pub reference_type: Option<String>,
    /// Source document ID.
    pub reference_id: Option<Uuid>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Acting user.
    pub actor_id: Option<UserId>,
}

impl StockReference {
    /// Reference with only a transaction type.
    #[must_use]
    pub const fn new(transaction_type: TransactionType) -> Self {
        Self {
            transaction_type,
            reference_type: None,
            reference_id: None,
            notes: None,
            actor_id: None,
        }
    }
}

/// A signed stock change to record.
#[derive(Debug, Clone)]
pub struct NewMovement {
    /// Owning business.
    pub business_id: BusinessId,
    /// Product whose stock changes.
    pub product_id: ProductId,
    /// Variant whose stock changes too, if any.
    pub variant_id: Option<VariantId>,
    /// Batch the movement belongs to, if any.
    pub batch_id: Option<BatchId>,
    /// Signed quantity; never zero.
    pub quantity_change: Decimal,
    /// Explicit movement type; derived from the sign when absent.
    pub movement_type: Option<MovementType>,
    /// Unit cost of the goods moved.
    pub unit_cost: Option<Decimal>,
    /// Source of the movement.
    pub reference: StockReference,
}

/// Input for receiving a new batch.
#[derive(Debug, Clone)]
pub struct ReceiveBatchInput {
    /// Owning business.
    pub business_id: BusinessId,
    /// Product received.
    pub product_id: ProductId,
    /// Supplier or internal lot number.
    pub batch_number: String,
    /// Quantity, prices and dates.
    pub fields: NewBatchFields,
    /// Receiving warehouse.
    pub warehouse_id: Option<WarehouseId>,
    /// Acting user.
    pub actor_id: Option<UserId>,
}

/// An applied allocation.
#[derive(Debug, Clone, Serialize)]
pub struct ConsumedStock {
    /// The plan that was applied.
    pub plan: AllocationPlan,
    /// One negative movement per plan line.
    pub movements: Vec<stock_movements::Model>,
}

/// Outcome of an expiry sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpirySweep {
    /// Batches flipped to expired.
    pub expired_batches: Vec<BatchId>,
    /// Products whose stock was recomputed.
    pub recomputed_products: Vec<ProductId>,
}

impl ExpirySweep {
    /// Returns true if the sweep changed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.expired_batches.is_empty()
    }
}

/// Batch and stock persistence.
pub struct InventoryRepository;

impl InventoryRepository {
    /// Active, non-deleted batches of a product with something free to allocate.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn candidates<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        product_id: ProductId,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<Vec<BatchCandidate>, StoreError> {
        let mut query = batches::Entity::find()
            .filter(batches::Column::BusinessId.eq(business_id.into_inner()))
            .filter(batches::Column::ProductId.eq(product_id.into_inner()))
            .filter(batches::Column::Status.eq(BatchStatus::Active))
            .filter(batches::Column::IsDeleted.eq(false))
            .filter(Expr::col(batches::Column::Quantity).gt(Expr::col(batches::Column::ReservedQuantity)));

        if let Some(warehouse_id) = warehouse_id {
            query = query.filter(batches::Column::WarehouseId.eq(warehouse_id.into_inner()));
        }

        let rows = query.order_by_asc(batches::Column::CreatedAt).all(conn).await?;
        Ok(rows.into_iter().map(to_candidate).collect())
    }

    /// Plans an allocation without touching any batch.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound`, `InvalidQuantity` or `InsufficientStock`.
    pub async fn allocate<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        request: &AllocationRequest,
        warehouse_id: Option<WarehouseId>,
    ) -> Result<AllocationPlan, StoreError> {
        Self::find_product(conn, business_id, request.product_id).await?;
        let candidates = Self::candidates(conn, business_id, request.product_id, warehouse_id).await?;
        let plan = LotAllocator::plan(request, candidates)?;
        for notice in &plan.notices {
            tracing::warn!(code = %notice.code, "{}", notice.message);
        }
        Ok(plan)
    }

    /// Decrements each planned batch and records one negative movement per line.
    ///
    /// # Errors
    ///
    /// Returns `AllocationConflict` if a batch no longer has the planned
    /// quantity free when the update runs.
    pub async fn apply_plan<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        plan: &AllocationPlan,
        reference: &StockReference,
    ) -> Result<Vec<stock_movements::Model>, StoreError> {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let mut movements = Vec::with_capacity(plan.lines.len());

        for line in &plan.lines {
            let result = batches::Entity::update_many()
                .col_expr(
                    batches::Column::Quantity,
                    Expr::col(batches::Column::Quantity).sub(line.quantity),
                )
                .col_expr(batches::Column::UpdatedAt, Expr::value(now))
                .filter(batches::Column::Id.eq(line.batch_id.into_inner()))
                .filter(batches::Column::BusinessId.eq(business_id.into_inner()))
                .filter(batches::Column::Status.eq(BatchStatus::Active))
                .filter(batches::Column::IsDeleted.eq(false))
                .filter(
                    Expr::col(batches::Column::Quantity)
                        .gte(Expr::col(batches::Column::ReservedQuantity).add(line.quantity)),
                )
                .exec(conn)
                .await?;

            if result.rows_affected != 1 {
                tracing::warn!(batch_id = %line.batch_id, "batch changed between planning and decrement");
                return Err(InventoryError::AllocationConflict(line.batch_id).into());
            }

            let movement = Self::record_movement(
                conn,
                NewMovement {
                    business_id,
                    product_id: plan.product_id,
                    variant_id: None,
                    batch_id: Some(line.batch_id),
                    quantity_change: -line.quantity,
                    movement_type: Some(consumption_movement(reference.transaction_type)),
                    unit_cost: Some(line.cost_price),
                    reference: reference.clone(),
                },
            )
            .await?;
            movements.push(movement);
        }

        Ok(movements)
    }

    /// Allocate and apply in one go.
    ///
    /// # Errors
    ///
    /// See [`Self::allocate`] and [`Self::apply_plan`].
    pub async fn consume<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        request: &AllocationRequest,
        warehouse_id: Option<WarehouseId>,
        reference: &StockReference,
    ) -> Result<ConsumedStock, StoreError> {
        let plan = Self::allocate(conn, business_id, request, warehouse_id).await?;
        let movements = Self::apply_plan(conn, business_id, &plan, reference).await?;
        Ok(ConsumedStock { plan, movements })
    }

    /// Appends a movement and moves product (and variant) stock by the same amount.
    ///
    /// Stock only moves when the movement's batch, if any, counts toward it;
    /// goods going into or out of an expired batch leave product stock as is.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for a zero change, `BatchNotFound` or
    /// `ProductNotFound`.
    pub async fn record_movement<C: ConnectionTrait>(
        conn: &C,
        movement: NewMovement,
    ) -> Result<stock_movements::Model, StoreError> {
        StockRules::validate_movement(movement.quantity_change)?;
        let movement_type = movement
            .movement_type
            .unwrap_or_else(|| MovementType::for_adjustment(movement.quantity_change));
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let stock_change = match movement.batch_id {
            Some(batch_id) => {
                let batch = Self::find_batch(conn, movement.business_id, batch_id).await?;
                if StockRules::counts_toward_stock(&level_of(&batch)) {
                    movement.quantity_change
                } else {
                    Decimal::ZERO
                }
            }
            None => movement.quantity_change,
        };

        let result = products::Entity::update_many()
            .col_expr(
                products::Column::Stock,
                Expr::col(products::Column::Stock).add(stock_change),
            )
            .col_expr(products::Column::UpdatedAt, Expr::value(now))
            .filter(products::Column::Id.eq(movement.product_id.into_inner()))
            .filter(products::Column::BusinessId.eq(movement.business_id.into_inner()))
            .exec(conn)
            .await?;
        if result.rows_affected == 0 {
            return Err(InventoryError::ProductNotFound(movement.product_id).into());
        }

        if let Some(variant_id) = movement.variant_id {
            let result = product_variants::Entity::update_many()
                .col_expr(
                    product_variants::Column::Stock,
                    Expr::col(product_variants::Column::Stock).add(stock_change),
                )
                .col_expr(product_variants::Column::UpdatedAt, Expr::value(now))
                .filter(product_variants::Column::Id.eq(variant_id.into_inner()))
                .filter(product_variants::Column::ProductId.eq(movement.product_id.into_inner()))
                .exec(conn)
                .await?;
            if result.rows_affected == 0 {
                return Err(StoreError::NotFound {
                    entity: "Product variant",
                    id: variant_id.into_inner(),
                });
            }
        }

        let reference = movement.reference;
        let model = stock_movements::ActiveModel {
            id: Set(StockMovementId::new().into_inner()),
            business_id: Set(movement.business_id.into_inner()),
            product_id: Set(movement.product_id.into_inner()),
            variant_id: Set(movement.variant_id.map(VariantId::into_inner)),
            batch_id: Set(movement.batch_id.map(BatchId::into_inner)),
            movement_type: Set(movement_type.into()),
            transaction_type: Set(reference.transaction_type.into()),
            quantity_change: Set(movement.quantity_change),
            unit_cost: Set(movement.unit_cost),
            reference_type: Set(reference.reference_type),
            reference_id: Set(reference.reference_id),
            notes: Set(reference.notes),
            created_by: Set(reference.actor_id.map(UserId::into_inner)),
            created_at: Set(now),
        }
        .insert(conn)
        .await?;

        tracing::debug!(
            product_id = %movement.product_id,
            quantity_change = %movement.quantity_change,
            movement_type = movement_type.as_str(),
            "stock movement recorded"
        );
        Ok(model)
    }

    /// Changes a batch's on-hand quantity, used by restocks and their reversal.
    ///
    /// Decrements are conditional on the free quantity like allocations.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound` or `InsufficientStock`.
    pub async fn adjust_batch_quantity<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        batch_id: BatchId,
        delta: Decimal,
    ) -> Result<(), StoreError> {
        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let mut update = batches::Entity::update_many()
            .col_expr(batches::Column::Quantity, Expr::col(batches::Column::Quantity).add(delta))
            .col_expr(batches::Column::UpdatedAt, Expr::value(now))
            .filter(batches::Column::Id.eq(batch_id.into_inner()))
            .filter(batches::Column::BusinessId.eq(business_id.into_inner()))
            .filter(batches::Column::IsDeleted.eq(false));
        if delta.is_sign_negative() {
            update = update.filter(
                Expr::col(batches::Column::Quantity)
                    .gte(Expr::col(batches::Column::ReservedQuantity).sub(delta)),
            );
        }

        if update.exec(conn).await?.rows_affected == 1 {
            return Ok(());
        }

        let batch = Self::find_batch(conn, business_id, batch_id).await?;
        Err(InventoryError::InsufficientStock {
            needed: -delta,
            available: batch.quantity - batch.reserved_quantity,
        }
        .into())
    }

    /// Reserves quantity on a batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound`, `BatchNotActive`, `OverReservation`, or
    /// `AllocationConflict` if the batch changed under us.
    pub async fn reserve<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        batch_id: BatchId,
        quantity: Decimal,
    ) -> Result<batches::Model, StoreError> {
        let batch = Self::find_batch(conn, business_id, batch_id).await?;
        StockRules::reserve(batch_id, &level_of(&batch), quantity)?;

        let result = batches::Entity::update_many()
            .col_expr(
                batches::Column::ReservedQuantity,
                Expr::col(batches::Column::ReservedQuantity).add(quantity),
            )
            .col_expr(batches::Column::UpdatedAt, Expr::value(chrono::Utc::now().fixed_offset()))
            .filter(batches::Column::Id.eq(batch_id.into_inner()))
            .filter(batches::Column::Status.eq(BatchStatus::Active))
            .filter(batches::Column::IsDeleted.eq(false))
            .filter(
                Expr::col(batches::Column::Quantity)
                    .gte(Expr::col(batches::Column::ReservedQuantity).add(quantity)),
            )
            .exec(conn)
            .await?;
        if result.rows_affected != 1 {
            return Err(InventoryError::AllocationConflict(batch_id).into());
        }

        tracing::debug!(batch_id = %batch_id, %quantity, "batch reserved");
        Self::find_batch(conn, business_id, batch_id).await
    }

    /// Releases reserved quantity on a batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound`, `OverRelease`, or `AllocationConflict`.
    pub async fn release<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        batch_id: BatchId,
        quantity: Decimal,
    ) -> Result<batches::Model, StoreError> {
        let batch = Self::find_batch(conn, business_id, batch_id).await?;
        StockRules::release(batch_id, &level_of(&batch), quantity)?;

        let result = batches::Entity::update_many()
            .col_expr(
                batches::Column::ReservedQuantity,
                Expr::col(batches::Column::ReservedQuantity).sub(quantity),
            )
            .col_expr(batches::Column::UpdatedAt, Expr::value(chrono::Utc::now().fixed_offset()))
            .filter(batches::Column::Id.eq(batch_id.into_inner()))
            .filter(batches::Column::ReservedQuantity.gte(quantity))
            .exec(conn)
            .await?;
        if result.rows_affected != 1 {
            return Err(InventoryError::AllocationConflict(batch_id).into());
        }

        tracing::debug!(batch_id = %batch_id, %quantity, "batch released");
        Self::find_batch(conn, business_id, batch_id).await
    }

    /// Businesses that currently have active batches past expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn businesses_with_expired<C: ConnectionTrait>(
        conn: &C,
        today: NaiveDate,
    ) -> Result<Vec<BusinessId>, StoreError> {
        let ids: Vec<Uuid> = batches::Entity::find()
            .select_only()
            .column(batches::Column::BusinessId)
            .distinct()
            .filter(batches::Column::Status.eq(BatchStatus::Active))
            .filter(batches::Column::IsDeleted.eq(false))
            .filter(batches::Column::ExpiryDate.lt(today))
            .filter(batches::Column::Quantity.gt(Decimal::ZERO))
            .into_tuple()
            .all(conn)
            .await?;
        Ok(ids.into_iter().map(BusinessId::from_uuid).collect())
    }

    /// Flips active batches past expiry to expired, zeroes their
    /// reservations and recomputes the affected products' stock.
    ///
    /// Running it again on the same day finds nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn deactivate_expired<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        today: NaiveDate,
    ) -> Result<ExpirySweep, StoreError> {
        let due = batches::Entity::find()
            .filter(batches::Column::BusinessId.eq(business_id.into_inner()))
            .filter(batches::Column::Status.eq(BatchStatus::Active))
            .filter(batches::Column::IsDeleted.eq(false))
            .filter(batches::Column::ExpiryDate.lt(today))
            .filter(batches::Column::Quantity.gt(Decimal::ZERO))
            .lock_exclusive()
            .all(conn)
            .await?;

        let due: Vec<batches::Model> = due
            .into_iter()
            .filter(|b| StockRules::is_expired(b.expiry_date, today))
            .collect();
        if due.is_empty() {
            return Ok(ExpirySweep::default());
        }

        let ids: Vec<Uuid> = due.iter().map(|b| b.id).collect();
        batches::Entity::update_many()
            .set(batches::ActiveModel {
                status: Set(BatchStatus::Expired),
                reserved_quantity: Set(Decimal::ZERO),
                updated_at: Set(chrono::Utc::now().into()),
                ..Default::default()
            })
            .filter(batches::Column::Id.is_in(ids))
            .exec(conn)
            .await?;

        let products: BTreeSet<Uuid> = due.iter().map(|b| b.product_id).collect();
        let mut sweep = ExpirySweep {
            expired_batches: due.iter().map(|b| BatchId::from_uuid(b.id)).collect(),
            recomputed_products: Vec::with_capacity(products.len()),
        };
        for product_id in products {
            let product_id = ProductId::from_uuid(product_id);
            Self::recompute_stock(conn, business_id, product_id).await?;
            sweep.recomputed_products.push(product_id);
        }

        tracing::info!(
            business_id = %business_id,
            batches = sweep.expired_batches.len(),
            products = sweep.recomputed_products.len(),
            "expired batches deactivated"
        );
        Ok(sweep)
    }

    /// Recomputes a product's stock from its batches and reports the drift.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound`.
    pub async fn reconcile_product_stock<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> Result<StockDrift, StoreError> {
        let product = products::Entity::find_by_id(product_id.into_inner())
            .filter(products::Column::BusinessId.eq(business_id.into_inner()))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or(InventoryError::ProductNotFound(product_id))?;

        let computed = Self::recompute_stock(conn, business_id, product_id).await?;
        let drift = StockRules::drift(product_id, product.stock, computed);
        if drift.has_drift() {
            tracing::warn!(
                product_id = %product_id,
                recorded = %drift.recorded,
                computed = %drift.computed,
                "product stock drift corrected"
            );
        }
        Ok(drift)
    }

    async fn recompute_stock<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> Result<Decimal, StoreError> {
        let batches = batches::Entity::find()
            .filter(batches::Column::BusinessId.eq(business_id.into_inner()))
            .filter(batches::Column::ProductId.eq(product_id.into_inner()))
            .all(conn)
            .await?;
        let levels: Vec<BatchLevel> = batches.iter().map(level_of).collect();
        let stock = StockRules::active_stock(&levels);

        products::Entity::update_many()
            .col_expr(products::Column::Stock, Expr::value(stock))
            .col_expr(products::Column::UpdatedAt, Expr::value(chrono::Utc::now().fixed_offset()))
            .filter(products::Column::Id.eq(product_id.into_inner()))
            .exec(conn)
            .await?;
        Ok(stock)
    }

    /// Creates an active batch and records the purchase movement.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity`, `InvalidBatch` or `ProductNotFound`.
    pub async fn receive_batch<C: ConnectionTrait>(
        conn: &C,
        input: ReceiveBatchInput,
    ) -> Result<batches::Model, StoreError> {
        StockRules::validate_new_batch(&input.batch_number, &input.fields)?;
        Self::find_product(conn, input.business_id, input.product_id).await?;

        let duplicate = batches::Entity::find()
            .filter(batches::Column::BusinessId.eq(input.business_id.into_inner()))
            .filter(batches::Column::ProductId.eq(input.product_id.into_inner()))
            .filter(batches::Column::BatchNumber.eq(input.batch_number.trim()))
            .one(conn)
            .await?;
        if duplicate.is_some() {
            return Err(InventoryError::InvalidBatch(format!(
                "batch number {} already exists",
                input.batch_number.trim()
            ))
            .into());
        }

        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let batch_id = BatchId::new();
        let batch = batches::ActiveModel {
            id: Set(batch_id.into_inner()),
            business_id: Set(input.business_id.into_inner()),
            product_id: Set(input.product_id.into_inner()),
            warehouse_id: Set(input.warehouse_id.map(WarehouseId::into_inner)),
            batch_number: Set(input.batch_number.trim().to_string()),
            quantity: Set(input.fields.quantity),
            reserved_quantity: Set(Decimal::ZERO),
            cost_price: Set(input.fields.cost_price),
            mrp: Set(input.fields.mrp),
            expiry_date: Set(input.fields.expiry_date),
            manufacturing_date: Set(input.fields.manufacturing_date),
            status: Set(BatchStatus::Active),
            is_deleted: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await?;

        Self::record_movement(
            conn,
            NewMovement {
                business_id: input.business_id,
                product_id: input.product_id,
                variant_id: None,
                batch_id: Some(batch_id),
                quantity_change: input.fields.quantity,
                movement_type: Some(MovementType::Purchase),
                unit_cost: Some(input.fields.cost_price),
                reference: StockReference {
                    reference_type: Some("batch".to_string()),
                    reference_id: Some(batch_id.into_inner()),
                    actor_id: input.actor_id,
                    ..StockReference::new(TransactionType::Purchase)
                },
            },
        )
        .await?;

        tracing::info!(batch_id = %batch_id, batch_number = %batch.batch_number, "batch received");
        Ok(batch)
    }

    /// Applies a typed patch to a batch's descriptive fields.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound` or `InvalidBatch`.
    pub async fn update_batch<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        batch_id: BatchId,
        patch: BatchPatch,
    ) -> Result<batches::Model, StoreError> {
        let batch = Self::find_batch(conn, business_id, batch_id).await?;
        if patch.is_empty() {
            return Ok(batch);
        }
        StockRules::validate_batch_patch(&patch, batch.expiry_date, batch.manufacturing_date)?;

        let mut active: batches::ActiveModel = batch.into();
        if let Some(batch_number) = patch.batch_number {
            active.batch_number = Set(batch_number.trim().to_string());
        }
        if let Some(cost_price) = patch.cost_price {
            active.cost_price = Set(cost_price);
        }
        if let Some(mrp) = patch.mrp {
            active.mrp = Set(mrp);
        }
        if let Some(expiry_date) = patch.expiry_date {
            active.expiry_date = Set(Some(expiry_date));
        }
        if let Some(manufacturing_date) = patch.manufacturing_date {
            active.manufacturing_date = Set(Some(manufacturing_date));
        }
        if let Some(warehouse_id) = patch.warehouse_id {
            active.warehouse_id = Set(Some(warehouse_id.into_inner()));
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(conn).await?)
    }

    /// Marks a serialized unit sold.
    ///
    /// # Errors
    ///
    /// Returns `SerialNotFound` or `SerialAlreadySold`.
    pub async fn sell_serial_unit<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        serial_number: &str,
        customer_id: Option<CustomerId>,
        invoice_id: Option<InvoiceId>,
    ) -> Result<serial_units::Model, StoreError> {
        let unit = Self::find_serial(conn, business_id, serial_number).await?;
        StockRules::validate_serial_sale(serial_number, unit.status.into())?;

        let now: DateTimeWithTimeZone = chrono::Utc::now().into();
        let result = serial_units::Entity::update_many()
            .set(serial_units::ActiveModel {
                status: Set(SerialStatus::Sold),
                customer_id: Set(customer_id.map(CustomerId::into_inner)),
                invoice_id: Set(invoice_id.map(InvoiceId::into_inner)),
                sold_at: Set(Some(now)),
                updated_at: Set(now),
                ..Default::default()
            })
            .filter(serial_units::Column::Id.eq(unit.id))
            .filter(serial_units::Column::Status.eq(SerialStatus::InStock))
            .exec(conn)
            .await?;
        if result.rows_affected != 1 {
            return Err(InventoryError::SerialAlreadySold(serial_number.to_string()).into());
        }

        tracing::info!(serial_unit_id = %SerialUnitId::from_uuid(unit.id), "serial unit sold");
        Self::find_serial(conn, business_id, serial_number).await
    }

    /// Loads a non-deleted batch.
    ///
    /// # Errors
    ///
    /// Returns `BatchNotFound`.
    pub async fn find_batch<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        batch_id: BatchId,
    ) -> Result<batches::Model, StoreError> {
        batches::Entity::find_by_id(batch_id.into_inner())
            .filter(batches::Column::BusinessId.eq(business_id.into_inner()))
            .filter(batches::Column::IsDeleted.eq(false))
            .one(conn)
            .await?
            .ok_or_else(|| InventoryError::BatchNotFound(batch_id).into())
    }

    /// Loads a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound`.
    pub async fn find_product<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> Result<products::Model, StoreError> {
        products::Entity::find_by_id(product_id.into_inner())
            .filter(products::Column::BusinessId.eq(business_id.into_inner()))
            .one(conn)
            .await?
            .ok_or_else(|| InventoryError::ProductNotFound(product_id).into())
    }

    async fn find_serial<C: ConnectionTrait>(
        conn: &C,
        business_id: BusinessId,
        serial_number: &str,
    ) -> Result<serial_units::Model, StoreError> {
        serial_units::Entity::find()
            .filter(serial_units::Column::BusinessId.eq(business_id.into_inner()))
            .filter(serial_units::Column::SerialNumber.eq(serial_number))
            .filter(serial_units::Column::IsDeleted.eq(false))
            .one(conn)
            .await?
            .ok_or_else(|| InventoryError::SerialNotFound(serial_number.to_string()).into())
    }
}

/// Movement type for stock leaving through an allocation.
fn consumption_movement(transaction_type: TransactionType) -> MovementType {
    match transaction_type {
        TransactionType::Sale => MovementType::Sale,
        _ => MovementType::AdjustmentOut,
    }
}

fn to_candidate(batch: batches::Model) -> BatchCandidate {
    BatchCandidate {
        batch_id: BatchId::from_uuid(batch.id),
        batch_number: batch.batch_number,
        quantity: batch.quantity,
        reserved_quantity: batch.reserved_quantity,
        cost_price: batch.cost_price,
        expiry_date: batch.expiry_date,
        created_at: batch.created_at.with_timezone(&chrono::Utc),
    }
}

fn level_of(batch: &batches::Model) -> BatchLevel {
    BatchLevel {
        quantity: batch.quantity,
        reserved_quantity: batch.reserved_quantity,
        status: batch.status.into(),
        is_deleted: batch.is_deleted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::inventory::BatchStatus as DomainBatchStatus;
    use rust_decimal_macros::dec;

    fn model(status: BatchStatus) -> batches::Model {
        let now = chrono::Utc::now().fixed_offset();
        batches::Model {
            id: Uuid::now_v7(),
            business_id: Uuid::now_v7(),
            product_id: Uuid::now_v7(),
            warehouse_id: None,
            batch_number: "LOT-7".to_string(),
            quantity: dec!(12),
            reserved_quantity: dec!(2),
            cost_price: dec!(3.10),
            mrp: dec!(5.00),
            expiry_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            manufacturing_date: None,
            status,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_candidate_mapping_keeps_availability() {
        let candidate = to_candidate(model(BatchStatus::Active));
        assert_eq!(candidate.available(), dec!(10));
        assert_eq!(candidate.batch_number, "LOT-7");
    }

    #[test]
    fn test_level_mapping() {
        let level = level_of(&model(BatchStatus::Expired));
        assert_eq!(level.status, DomainBatchStatus::Expired);
        assert_eq!(StockRules::active_stock(&[level]), Decimal::ZERO);
    }

    #[test]
    fn test_consumption_movement_type() {
        assert_eq!(consumption_movement(TransactionType::Sale), MovementType::Sale);
        assert_eq!(
            consumption_movement(TransactionType::Production),
            MovementType::AdjustmentOut
        );
    }

    #[test]
    fn test_empty_sweep() {
        assert!(ExpirySweep::default().is_empty());
    }
}
