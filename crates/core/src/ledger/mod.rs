//! Double-entry bookkeeping logic.
//!
//! This module implements the posting side of the general ledger:
//! - Domain types for posting requests and the chart of accounts
//! - Line shape and balance validation
//! - Account code resolution
//! - Reversing-line construction and batch verification

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::LedgerError;
pub use service::LedgerService;
pub use types::{
    AccountInfo, AccountPatch, AccountType, GlLineInput, NormalBalance, PostingRequest,
    PostingTotals, ResolvedLine,
};
