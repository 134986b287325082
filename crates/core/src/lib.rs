//! Core ledger and inventory logic for the back office.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry posting validation and the chart of accounts
//! - `fiscal` - Fiscal period state machine and posting guard
//! - `reports` - Trial balance computation
//! - `inventory` - FEFO/FIFO lot allocation, reservations and expiry
//! - `reversal` - Credit notes and refunds

pub mod error;
pub mod fiscal;
pub mod inventory;
pub mod ledger;
pub mod reports;
pub mod reversal;

pub use error::DomainError;
