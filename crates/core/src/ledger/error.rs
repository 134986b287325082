//! Ledger error types for posting and chart-of-accounts errors.

use backoffice_shared::{AppError, ErrorCategory};
use backoffice_shared::types::GlBatchId;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::error::DomainError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Contract Violations ==========
    /// A posting must have at least two lines.
    #[error("Posting must have at least 2 lines")]
    InsufficientLines,

    /// Debits and credits differ by more than the tolerance.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Line amounts cannot be negative.
    #[error("Line for account {0} has a negative amount")]
    NegativeAmount(String),

    /// A line must carry either a debit or a credit, not both.
    #[error("Line for account {0} has both a debit and a credit")]
    BothSides(String),

    /// A line with neither a debit nor a credit.
    #[error("Line for account {0} has no amount")]
    ZeroLine(String),

    /// No account with this code exists for the business.
    #[error("Unknown account code: {0}")]
    UnknownAccount(String),

    /// A persisted batch no longer balances.
    #[error("Ledger batch {batch_id} is not balanced. Debit: {debit}, Credit: {credit}")]
    CorruptBatch {
        /// The batch that failed verification.
        batch_id: GlBatchId,
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    // ========== Chart of Accounts ==========
    /// Account code or name is empty.
    #[error("Account {0} cannot be empty")]
    EmptyAccountField(&'static str),

    /// Another account already uses this code.
    #[error("Account code {0} already exists")]
    DuplicateAccountCode(String),

    /// Code cannot change once ledger lines reference the account.
    #[error("Account code {0} is referenced by posted entries and cannot change")]
    AccountCodeImmutable(String),

    /// Type cannot change once ledger lines reference the account.
    #[error("Cannot change type of account {0} because it has ledger entries")]
    AccountTypeChangeNotAllowed(String),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Ledger batch not found.
    #[error("Ledger batch not found: {0}")]
    BatchNotFound(GlBatchId),
}

impl DomainError for LedgerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::NegativeAmount(_) => "NEGATIVE_AMOUNT",
            Self::BothSides(_) => "BOTH_SIDES",
            Self::ZeroLine(_) => "ZERO_LINE",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::CorruptBatch { .. } => "CORRUPT_BATCH",
            Self::EmptyAccountField(_) => "EMPTY_ACCOUNT_FIELD",
            Self::DuplicateAccountCode(_) => "DUPLICATE_ACCOUNT_CODE",
            Self::AccountCodeImmutable(_) => "ACCOUNT_CODE_IMMUTABLE",
            Self::AccountTypeChangeNotAllowed(_) => "ACCOUNT_TYPE_CHANGE_NOT_ALLOWED",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::BatchNotFound(_) => "BATCH_NOT_FOUND",
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::InsufficientLines
            | Self::UnbalancedEntry { .. }
            | Self::NegativeAmount(_)
            | Self::BothSides(_)
            | Self::ZeroLine(_)
            | Self::UnknownAccount(_) => ErrorCategory::Contract,

            Self::CorruptBatch { .. } => ErrorCategory::Infrastructure,

            Self::EmptyAccountField(_)
            | Self::DuplicateAccountCode(_)
            | Self::AccountCodeImmutable(_)
            | Self::AccountTypeChangeNotAllowed(_) => ErrorCategory::BusinessRule,

            Self::AccountNotFound(_) | Self::BatchNotFound(_) => ErrorCategory::NotFound,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        err.to_app_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_shared::Severity;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::InsufficientLines.error_code(), "INSUFFICIENT_LINES");
        assert_eq!(
            LedgerError::UnbalancedEntry {
                debit: dec!(100),
                credit: dec!(50),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(
            LedgerError::UnknownAccount("9999".into()).error_code(),
            "UNKNOWN_ACCOUNT"
        );
    }

    #[test]
    fn test_contract_violations_are_fatal() {
        let err = LedgerError::UnbalancedEntry {
            debit: dec!(100),
            credit: dec!(50),
        };
        assert_eq!(err.category(), ErrorCategory::Contract);
        assert_eq!(err.severity(), Severity::Fatal);
        assert!(!err.is_retryable());

        let err = LedgerError::UnknownAccount("9999".into());
        assert_eq!(err.severity(), Severity::Fatal);
    }

    #[test]
    fn test_business_rule_errors() {
        let err = LedgerError::AccountCodeImmutable("1000".into());
        assert_eq!(err.category(), ErrorCategory::BusinessRule);
        assert_eq!(err.severity(), Severity::Error);
    }

    #[test]
    fn test_into_app_error_keeps_amounts() {
        let app: AppError = LedgerError::UnbalancedEntry {
            debit: dec!(100.00),
            credit: dec!(90.00),
        }
        .into();
        assert_eq!(app.error_code(), "UNBALANCED_ENTRY");
        assert_eq!(app.status_code(), 400);
        assert!(app.to_string().contains("100.00"));
        assert!(app.to_string().contains("90.00"));
    }
}
