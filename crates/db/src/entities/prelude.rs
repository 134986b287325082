//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::batches::Entity as Batches;
pub use super::businesses::Entity as Businesses;
pub use super::credit_note_items::Entity as CreditNoteItems;
pub use super::credit_notes::Entity as CreditNotes;
pub use super::customers::Entity as Customers;
pub use super::fiscal_periods::Entity as FiscalPeriods;
pub use super::gl_entries::Entity as GlEntries;
pub use super::invoice_items::Entity as InvoiceItems;
pub use super::invoices::Entity as Invoices;
pub use super::payment_allocations::Entity as PaymentAllocations;
pub use super::pos_transaction_items::Entity as PosTransactionItems;
pub use super::pos_transactions::Entity as PosTransactions;
pub use super::product_variants::Entity as ProductVariants;
pub use super::products::Entity as Products;
pub use super::refund_items::Entity as RefundItems;
pub use super::refunds::Entity as Refunds;
pub use super::serial_units::Entity as SerialUnits;
pub use super::stock_movements::Entity as StockMovements;
