//! Repositories, one per component.
//!
//! Every function takes the connection or transaction to run on. None of
//! them open or commit a transaction; that is the job of
//! [`crate::operations::Operations`].

pub mod account;
pub mod fiscal;
pub mod inventory;
pub mod ledger;
pub mod report;
pub mod reversal;

pub use account::{AccountRepository, CreateAccountInput};
pub use fiscal::FiscalRepository;
pub use inventory::{
    ConsumedStock, ExpirySweep, InventoryRepository, NewMovement, ReceiveBatchInput,
    StockReference,
};
pub use ledger::{LedgerRepository, PostedBatch, PostedLine};
pub use report::ReportRepository;
pub use reversal::{
    AppliedCreditNote, CancelledCreditNote, IssueCreditNoteInput, IssueRefundInput,
    IssuedCreditNote, IssuedRefund, ReversalRepository,
};
