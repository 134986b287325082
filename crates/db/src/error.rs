//! Storage-layer error type.

use backoffice_core::DomainError;
use backoffice_core::fiscal::FiscalError;
use backoffice_core::inventory::InventoryError;
use backoffice_core::ledger::LedgerError;
use backoffice_core::reports::ReportError;
use backoffice_core::reversal::ReversalError;
use backoffice_shared::{AppError, ErrorCategory, Severity};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by repositories and the operations facade.
///
/// Domain variants keep the core error intact so callers can still read its
/// amounts, code and severity.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Ledger posting or chart-of-accounts error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Fiscal period error.
    #[error(transparent)]
    Fiscal(#[from] FiscalError),

    /// Inventory error.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Credit note or refund error.
    #[error(transparent)]
    Reversal(#[from] ReversalError),

    /// Report error.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// A reference record this core reads but does not own is missing.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity name.
        entity: &'static str,
        /// Requested ID.
        id: Uuid,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl StoreError {
    fn domain(&self) -> Option<&dyn DomainError> {
        match self {
            Self::Ledger(e) => Some(e as &dyn DomainError),
            Self::Fiscal(e) => Some(e as &dyn DomainError),
            Self::Inventory(e) => Some(e as &dyn DomainError),
            Self::Reversal(e) => Some(e as &dyn DomainError),
            Self::Report(e) => Some(e as &dyn DomainError),
            Self::NotFound { .. } | Self::Database(_) => None,
        }
    }

    /// A unique index rejected the write, typically two writers racing for
    /// the same document number.
    fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Database(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        )
    }

    /// Stable machine-readable code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Database(_) if self.is_unique_violation() => "UNIQUE_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            _ => self.domain().map_or("INTERNAL_ERROR", |d| d.error_code()),
        }
    }

    /// Error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Database(_) if self.is_unique_violation() => ErrorCategory::Conflict,
            Self::Database(_) => ErrorCategory::Infrastructure,
            _ => self
                .domain()
                .map_or(ErrorCategory::Infrastructure, |d| d.category()),
        }
    }

    /// Severity assigned where the condition was detected.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::NotFound { .. } => Severity::Error,
            Self::Database(_) if self.is_unique_violation() => Severity::Error,
            Self::Database(_) => Severity::Fatal,
            _ => self.domain().map_or(Severity::Fatal, |d| d.severity()),
        }
    }

    /// Returns true if retrying the whole operation may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::Database(_) if err.is_unique_violation() => Self::Conflict(err.to_string()),
            StoreError::Database(e) => Self::Database(e.to_string()),
            other => Self::domain(
                other.error_code(),
                other.category(),
                other.severity(),
                other.to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_shared::types::{BatchId, FiscalPeriodId};
    use rust_decimal_macros::dec;

    #[test]
    fn test_domain_tags_survive_wrapping() {
        let err: StoreError = InventoryError::InsufficientStock {
            needed: dec!(12),
            available: dec!(10),
        }
        .into();
        assert_eq!(err.error_code(), "INSUFFICIENT_STOCK");
        assert_eq!(err.category(), ErrorCategory::BusinessRule);
        assert_eq!(err.severity(), Severity::Error);

        let app: AppError = err.into();
        assert_eq!(app.status_code(), 422);
        assert_eq!(app.error_code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn test_only_conflicts_are_retryable() {
        let conflict: StoreError = InventoryError::AllocationConflict(BatchId::new()).into();
        assert!(conflict.is_retryable());

        let missing: StoreError = FiscalError::PeriodNotFound(FiscalPeriodId::new()).into();
        assert!(!missing.is_retryable());
        assert_eq!(AppError::from(missing).status_code(), 404);
    }

    #[test]
    fn test_database_errors_are_fatal() {
        let err = StoreError::Database(DbErr::Custom("connection reset".into()));
        assert_eq!(err.severity(), Severity::Fatal);
        assert_eq!(err.category(), ErrorCategory::Infrastructure);
        assert!(!err.is_retryable());
        assert_eq!(AppError::from(err).status_code(), 500);
    }

    #[test]
    fn test_reference_not_found() {
        let err = StoreError::NotFound {
            entity: "Customer",
            id: Uuid::nil(),
        };
        assert_eq!(err.to_string(), format!("Customer not found: {}", Uuid::nil()));
        assert_eq!(AppError::from(err).status_code(), 404);
    }
}
