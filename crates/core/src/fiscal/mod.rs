//! Fiscal period management.

pub mod error;
pub mod guard;
pub mod period;

#[cfg(test)]
mod guard_props;

pub use error::FiscalError;
pub use guard::{FiscalPeriodGuard, NO_FISCAL_PERIOD};
pub use period::{FiscalPeriod, FiscalPeriodStatus};
