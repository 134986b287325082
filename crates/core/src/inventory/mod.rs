//! Lot-based inventory logic.
//!
//! - FEFO/FIFO allocation planning over batches
//! - Reservation and release rules
//! - Expiry detection and batch-derived stock levels
//! - Movement and serialized-unit rules

pub mod allocator;
pub mod error;
pub mod stock;
pub mod types;

#[cfg(test)]
mod allocator_props;

pub use allocator::{AllocationRequest, LotAllocator, NEAR_EXPIRY};
pub use error::InventoryError;
pub use stock::{BatchLevel, NewBatchFields, StockRules};
pub use types::{
    AllocationLine, AllocationPlan, AllocationStrategy, BatchCandidate, BatchPatch, BatchStatus,
    MovementType, SerialStatus, StockDrift, TransactionType,
};
