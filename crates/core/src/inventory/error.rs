//! Inventory error types.

use backoffice_shared::types::{BatchId, ProductId};
use backoffice_shared::{AppError, ErrorCategory};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::DomainError;

/// Errors that can occur during allocation and stock changes.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Quantity must be positive.
    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(Decimal),

    /// Active batches cannot cover the request.
    #[error("Insufficient stock: needed {needed}, available {available}")]
    InsufficientStock {
        /// Quantity requested.
        needed: Decimal,
        /// Quantity available across all candidate batches.
        available: Decimal,
    },

    /// Reservation would exceed what the batch has free.
    #[error("Cannot reserve {requested} on batch {batch_id}: only {available} available")]
    OverReservation {
        /// Batch targeted.
        batch_id: BatchId,
        /// Quantity requested.
        requested: Decimal,
        /// Unreserved quantity.
        available: Decimal,
    },

    /// Release would drive the reservation below zero.
    #[error("Cannot release {requested} on batch {batch_id}: only {reserved} reserved")]
    OverRelease {
        /// Batch targeted.
        batch_id: BatchId,
        /// Quantity requested.
        requested: Decimal,
        /// Currently reserved quantity.
        reserved: Decimal,
    },

    /// Batch is expired or deleted.
    #[error("Batch {0} is not active")]
    BatchNotActive(BatchId),

    /// A concurrent writer changed the batch between planning and decrement.
    #[error("Batch {0} changed concurrently, retry the operation")]
    AllocationConflict(BatchId),

    /// Serialized unit already sold.
    #[error("Serial unit {0} is already sold")]
    SerialAlreadySold(String),

    /// Batch fields are invalid.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    /// Batch not found.
    #[error("Batch not found: {0}")]
    BatchNotFound(BatchId),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Serialized unit not found.
    #[error("Serial unit not found: {0}")]
    SerialNotFound(String),
}

impl DomainError for InventoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::OverReservation { .. } => "OVER_RESERVATION",
            Self::OverRelease { .. } => "OVER_RELEASE",
            Self::BatchNotActive(_) => "BATCH_NOT_ACTIVE",
            Self::AllocationConflict(_) => "ALLOCATION_CONFLICT",
            Self::SerialAlreadySold(_) => "SERIAL_ALREADY_SOLD",
            Self::InvalidBatch(_) => "INVALID_BATCH",
            Self::BatchNotFound(_) => "BATCH_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::SerialNotFound(_) => "SERIAL_NOT_FOUND",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidQuantity(_) | Self::InvalidBatch(_) => ErrorCategory::Contract,
            Self::InsufficientStock { .. }
            | Self::OverReservation { .. }
            | Self::OverRelease { .. }
            | Self::BatchNotActive(_)
            | Self::SerialAlreadySold(_) => ErrorCategory::BusinessRule,
            Self::AllocationConflict(_) => ErrorCategory::Conflict,
            Self::BatchNotFound(_) | Self::ProductNotFound(_) | Self::SerialNotFound(_) => {
                ErrorCategory::NotFound
            }
        }
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        err.to_app_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_shared::Severity;
    use rust_decimal_macros::dec;

    #[test]
    fn test_conflict_is_retryable() {
        let err = InventoryError::AllocationConflict(BatchId::new());
        assert!(err.is_retryable());
        assert_eq!(err.to_app_error().status_code(), 409);
    }

    #[test]
    fn test_insufficient_stock_carries_amounts() {
        let err = InventoryError::InsufficientStock {
            needed: dec!(12),
            available: dec!(10),
        };
        assert_eq!(err.category(), ErrorCategory::BusinessRule);
        assert_eq!(err.severity(), Severity::Error);
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Insufficient stock: needed 12, available 10");
    }
}
