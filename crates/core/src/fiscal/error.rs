//! Fiscal period error types.

use backoffice_shared::types::FiscalPeriodId;
use backoffice_shared::{AppError, ErrorCategory};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::period::FiscalPeriodStatus;
use crate::error::DomainError;

/// Errors raised by the fiscal period guard.
#[derive(Debug, Error)]
pub enum FiscalError {
    /// Posting into a closed or locked period.
    #[error("Fiscal period '{name}' is {status}, no posting allowed")]
    PeriodClosed {
        /// Period name.
        name: String,
        /// Current status.
        status: FiscalPeriodStatus,
    },

    /// Reopening a locked period.
    #[error("Fiscal period '{0}' is locked and cannot be reopened")]
    PeriodLocked(String),

    /// The period's own entries do not balance, so it cannot close.
    #[error("Fiscal period '{name}' is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedPeriod {
        /// Period name.
        name: String,
        /// Total debits in the period.
        debit: Decimal,
        /// Total credits in the period.
        credit: Decimal,
    },

    /// The new period's range collides with an existing one.
    #[error("Fiscal period overlaps existing period '{0}'")]
    Overlap(String),

    /// Start date after end date.
    #[error("Invalid period range: {start} is after {end}")]
    InvalidDateRange {
        /// Requested start.
        start: NaiveDate,
        /// Requested end.
        end: NaiveDate,
    },

    /// Period name is blank.
    #[error("Fiscal period name cannot be empty")]
    EmptyName,

    /// State machine forbids this transition.
    #[error("Fiscal period '{name}' cannot move from {from} to {to}")]
    InvalidTransition {
        /// Period name.
        name: String,
        /// Current status.
        from: FiscalPeriodStatus,
        /// Requested status.
        to: FiscalPeriodStatus,
    },

    /// Period not found.
    #[error("Fiscal period not found: {0}")]
    PeriodNotFound(FiscalPeriodId),
}

impl DomainError for FiscalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::PeriodLocked(_) => "PERIOD_LOCKED",
            Self::UnbalancedPeriod { .. } => "UNBALANCED_PERIOD",
            Self::Overlap(_) => "PERIOD_OVERLAP",
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::EmptyName => "EMPTY_PERIOD_NAME",
            Self::InvalidTransition { .. } => "INVALID_PERIOD_TRANSITION",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::PeriodNotFound(_) => ErrorCategory::NotFound,
            _ => ErrorCategory::BusinessRule,
        }
    }
}

impl From<FiscalError> for AppError {
    fn from(err: FiscalError) -> Self {
        err.to_app_error()
    }
}
