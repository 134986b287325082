//! `SeaORM` entity definitions.

pub mod prelude;

pub mod accounts;
pub mod batches;
pub mod businesses;
pub mod credit_note_items;
pub mod credit_notes;
pub mod customers;
pub mod fiscal_periods;
pub mod gl_entries;
pub mod invoice_items;
pub mod invoices;
pub mod payment_allocations;
pub mod pos_transaction_items;
pub mod pos_transactions;
pub mod product_variants;
pub mod products;
pub mod refund_items;
pub mod refunds;
pub mod sea_orm_active_enums;
pub mod serial_units;
pub mod stock_movements;
