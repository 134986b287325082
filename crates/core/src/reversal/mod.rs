//! Credit notes and refunds.
//!
//! Reversals are capped so the cumulative non-cancelled amount never exceeds
//! the source document's total.

pub mod error;
pub mod numbering;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ReversalError;
pub use numbering::next_document_number;
pub use service::ReversalService;
pub use types::{
    CreditNoteStatus, PaymentStatus, PosRefundStatus, RefundMethod, RefundType, ReversalAmounts,
    ReversalKind, ReversalLineInput,
};
