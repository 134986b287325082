//! Report error types.

use backoffice_shared::{AppError, ErrorCategory};
use chrono::NaiveDate;
use thiserror::Error;

use crate::error::DomainError;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },
}

impl DomainError for ReportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::BusinessRule
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        err.to_app_error()
    }
}
