//! Credit note and refund types.

use backoffice_shared::types::{BatchId, ProductId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of reversal document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversalKind {
    /// Reverses part or all of a sales invoice.
    CreditNote,
    /// Reverses part or all of a POS transaction.
    Refund,
}

impl ReversalKind {
    /// Document number prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::CreditNote => "CN",
            Self::Refund => "RF",
        }
    }

    /// Reference type written on ledger lines and stock movements.
    #[must_use]
    pub const fn reference_type(self) -> &'static str {
        match self {
            Self::CreditNote => "credit_note",
            Self::Refund => "refund",
        }
    }
}

/// One returned line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversalLineInput {
    /// Line of the source document being reversed.
    #[serde(default)]
    pub source_item_id: Option<Uuid>,
    /// Product returned, required for restocking.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    /// Variant returned.
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Batch to put the goods back into.
    #[serde(default)]
    pub batch_id: Option<BatchId>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Quantity returned.
    pub quantity: Decimal,
    /// Unit selling price.
    pub unit_price: Decimal,
    /// Tax on this line, as computed by the caller.
    #[serde(default)]
    pub tax_amount: Decimal,
    /// Unit cost for restocked goods.
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    /// Whether the goods go back into stock.
    #[serde(default)]
    pub restock: bool,
}

/// Totals of a reversal document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReversalAmounts {
    /// Sum of `quantity * unit_price`.
    pub subtotal: Decimal,
    /// Sum of line tax.
    pub tax_amount: Decimal,
    /// `subtotal + tax_amount`.
    pub total_amount: Decimal,
    /// Cost of goods put back into stock.
    pub restock_cost: Decimal,
}

/// Lifecycle of a credit note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreditNoteStatus {
    /// Issued and not yet used.
    Issued,
    /// Applied against an invoice.
    Applied,
    /// Cancelled; no longer counts toward the cap.
    Cancelled,
}

impl std::fmt::Display for CreditNoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Issued => "issued",
            Self::Applied => "applied",
            Self::Cancelled => "cancelled",
        })
    }
}

/// Whether a refund returns the whole transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundType {
    /// Cumulative refunds reach the transaction total.
    Full,
    /// Anything less.
    Partial,
}

/// How money goes back to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundMethod {
    /// Cash drawer.
    Cash,
    /// Bank transfer.
    Bank,
    /// Card reversal, settled through the bank account.
    Card,
}

/// Invoice payment state derived from its allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing allocated.
    Unpaid,
    /// Some but not all allocated.
    PartiallyPaid,
    /// Fully allocated.
    Paid,
}

/// POS transaction state after a refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosRefundStatus {
    /// Part of the transaction refunded.
    PartiallyRefunded,
    /// The whole transaction refunded.
    Refunded,
}
