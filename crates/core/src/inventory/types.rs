//! Inventory domain types: batches, allocation plans, movements.

use backoffice_shared::Notice;
use backoffice_shared::types::{BatchId, ProductId, WarehouseId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order in which batches are drawn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStrategy {
    /// First-Expiry-First-Out: earliest expiry first, undated batches last.
    #[default]
    Fefo,
    /// First-In-First-Out: oldest batch first.
    Fifo,
}

/// Lifecycle of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// Sellable.
    Active,
    /// Past its expiry date; contributes nothing to stock.
    Expired,
}

impl BatchStatus {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }
}

/// Lifecycle of a serialized unit. Only `InStock -> Sold` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerialStatus {
    /// On hand.
    InStock,
    /// Sold to a customer.
    Sold,
}

/// What kind of stock change a movement records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Goods received from a supplier.
    Purchase,
    /// Goods sold.
    Sale,
    /// Goods returned by a customer.
    Return,
    /// Manual increase.
    AdjustmentIn,
    /// Manual decrease.
    AdjustmentOut,
}

impl MovementType {
    /// Movement type for an unclassified signed change.
    #[must_use]
    pub fn for_adjustment(quantity_change: Decimal) -> Self {
        if quantity_change.is_sign_negative() {
            Self::AdjustmentOut
        } else {
            Self::AdjustmentIn
        }
    }

    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Sale => "sale",
            Self::Return => "return",
            Self::AdjustmentIn => "adjustment_in",
            Self::AdjustmentOut => "adjustment_out",
        }
    }
}

/// Business transaction that caused a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Sales invoice or POS sale.
    Sale,
    /// Purchase receipt.
    Purchase,
    /// Customer return (credit note or refund).
    Return,
    /// Stock count or manual correction.
    Adjustment,
    /// Consumed or produced by manufacturing.
    Production,
    /// Moved between warehouses.
    Transfer,
}

impl TransactionType {
    /// Returns the storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sale => "sale",
            Self::Purchase => "purchase",
            Self::Return => "return",
            Self::Adjustment => "adjustment",
            Self::Production => "production",
            Self::Transfer => "transfer",
        }
    }
}

/// A batch eligible for allocation, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCandidate {
    /// Batch ID.
    pub batch_id: BatchId,
    /// Supplier or internal lot number.
    pub batch_number: String,
    /// On-hand quantity.
    pub quantity: Decimal,
    /// Quantity held by reservations.
    pub reserved_quantity: Decimal,
    /// Unit cost.
    pub cost_price: Decimal,
    /// Expiry date, if the product perishes.
    pub expiry_date: Option<NaiveDate>,
    /// Receipt time.
    pub created_at: DateTime<Utc>,
}

impl BatchCandidate {
    /// Quantity that can still be allocated.
    #[must_use]
    pub fn available(&self) -> Decimal {
        (self.quantity - self.reserved_quantity).max(Decimal::ZERO)
    }
}

/// One batch's share of an allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLine {
    /// Batch drawn from.
    pub batch_id: BatchId,
    /// Batch number for display.
    pub batch_number: String,
    /// Quantity taken.
    pub quantity: Decimal,
    /// Unit cost of the batch.
    pub cost_price: Decimal,
    /// Expiry of the batch.
    pub expiry_date: Option<NaiveDate>,
    /// Receipt time of the batch.
    pub created_at: DateTime<Utc>,
}

impl AllocationLine {
    /// Cost of the quantity taken.
    #[must_use]
    pub fn line_cost(&self) -> Decimal {
        self.quantity * self.cost_price
    }
}

/// An ordered set of batch draws covering exactly the requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Product allocated.
    pub product_id: ProductId,
    /// Strategy used.
    pub strategy: AllocationStrategy,
    /// Quantity requested (equals the sum of line quantities).
    pub requested: Decimal,
    /// Draws in strategy order.
    pub lines: Vec<AllocationLine>,
    /// Sum of line costs.
    pub total_cost: Decimal,
    /// Non-fatal conditions such as near-expiry lots.
    pub notices: Vec<Notice>,
}

/// Stock recorded on a product versus what its batches add up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDrift {
    /// Product checked.
    pub product_id: ProductId,
    /// Denormalized stock before reconciliation.
    pub recorded: Decimal,
    /// Sum over active, non-deleted batches.
    pub computed: Decimal,
}

impl StockDrift {
    /// `computed - recorded`.
    #[must_use]
    pub fn drift(&self) -> Decimal {
        self.computed - self.recorded
    }

    /// Returns true if recorded stock needed correcting.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        !self.drift().is_zero()
    }
}

/// Editable batch attributes. Quantities only change through movements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPatch {
    /// New lot number.
    pub batch_number: Option<String>,
    /// New unit cost.
    pub cost_price: Option<Decimal>,
    /// New maximum retail price.
    pub mrp: Option<Decimal>,
    /// New expiry date.
    pub expiry_date: Option<NaiveDate>,
    /// New manufacturing date.
    pub manufacturing_date: Option<NaiveDate>,
    /// Move the batch to another warehouse.
    pub warehouse_id: Option<WarehouseId>,
}

impl BatchPatch {
    /// Returns true if nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch_number.is_none()
            && self.cost_price.is_none()
            && self.mrp.is_none()
            && self.expiry_date.is_none()
            && self.manufacturing_date.is_none()
            && self.warehouse_id.is_none()
    }
}
