//! Reversal error types.

use backoffice_shared::types::{CreditNoteId, InvoiceId, PosTransactionId};
use backoffice_shared::{AppError, ErrorCategory};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::CreditNoteStatus;
use crate::error::DomainError;

/// Errors raised while issuing, applying or cancelling reversals.
#[derive(Debug, Error)]
pub enum ReversalError {
    /// Cumulative reversals would exceed the source total.
    #[error(
        "Reversal of {requested} exceeds the remaining allowance of {remaining} ({already_reversed} already reversed)"
    )]
    OverReversal {
        /// Amount requested now.
        requested: Decimal,
        /// Sum of prior non-cancelled reversals.
        already_reversed: Decimal,
        /// What may still be reversed.
        remaining: Decimal,
    },

    /// No lines given.
    #[error("Reversal must have at least one line")]
    EmptyReversal,

    /// A line is malformed.
    #[error("Line {index} is invalid: {reason}")]
    InvalidLine {
        /// Zero-based line index.
        index: usize,
        /// What is wrong.
        reason: String,
    },

    /// Lines add up to nothing.
    #[error("Reversal total must be positive")]
    ZeroTotal,

    /// Apply amount must be positive.
    #[error("Amount to apply must be positive, got {0}")]
    InvalidApplyAmount(Decimal),

    /// Credit note is not in the issued state.
    #[error("Credit note {number} is {status}, expected issued")]
    CreditNoteNotIssued {
        /// Credit note number.
        number: String,
        /// Current status.
        status: CreditNoteStatus,
    },

    /// Target invoice is already settled.
    #[error("Invoice {0} has no outstanding balance")]
    InvoiceSettled(String),

    /// Credit note and invoice belong to different customers.
    #[error("Credit note {0} belongs to a different customer than the target invoice")]
    CustomerMismatch(String),

    /// Invoice not found for the business.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// POS transaction not found for the business.
    #[error("POS transaction not found: {0}")]
    TransactionNotFound(PosTransactionId),

    /// Credit note not found for the business.
    #[error("Credit note not found: {0}")]
    CreditNoteNotFound(CreditNoteId),
}

impl DomainError for ReversalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::OverReversal { .. } => "OVER_REVERSAL",
            Self::EmptyReversal => "EMPTY_REVERSAL",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::ZeroTotal => "ZERO_TOTAL",
            Self::InvalidApplyAmount(_) => "INVALID_APPLY_AMOUNT",
            Self::CreditNoteNotIssued { .. } => "CREDIT_NOTE_NOT_ISSUED",
            Self::CustomerMismatch(_) => "CUSTOMER_MISMATCH",
            Self::InvoiceSettled(_) => "INVOICE_SETTLED",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::CreditNoteNotFound(_) => "CREDIT_NOTE_NOT_FOUND",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyReversal | Self::InvalidLine { .. } | Self::ZeroTotal | Self::InvalidApplyAmount(_) => {
                ErrorCategory::Contract
            }
            Self::OverReversal { .. }
            | Self::CreditNoteNotIssued { .. }
            | Self::CustomerMismatch(_)
            | Self::InvoiceSettled(_) => ErrorCategory::BusinessRule,
            Self::InvoiceNotFound(_) | Self::TransactionNotFound(_) | Self::CreditNoteNotFound(_) => {
                ErrorCategory::NotFound
            }
        }
    }
}

impl From<ReversalError> for AppError {
    fn from(err: ReversalError) -> Self {
        err.to_app_error()
    }
}
