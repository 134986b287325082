//! Trial balance reporting.
//!
//! Pure aggregation over per-account ledger sums read by the database layer.

pub mod error;
pub mod service;
pub mod types;


pub use error::ReportError;
pub use service::TrialBalanceCalculator;
pub use types::{AccountActivity, TrialBalance, TrialBalanceRow, TrialBalanceTotals};
