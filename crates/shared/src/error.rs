//! Application-wide error types.
//!
//! Domain errors in `backoffice-core` classify themselves with an
//! [`ErrorCategory`] and a [`Severity`]; callers branch on those tags and never
//! on message text. Non-fatal conditions travel on successful results as
//! [`Notice`] values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Broad class of a failure, used to decide how a caller reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The caller broke an API contract (unbalanced batch, unknown account).
    Contract,
    /// A business rule rejected the request.
    BusinessRule,
    /// A referenced record does not exist for the business.
    NotFound,
    /// A concurrent writer won; the whole operation may be retried.
    Conflict,
    /// Storage or other infrastructure failure.
    Infrastructure,
}

/// How serious a condition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational; the operation succeeded.
    Warning,
    /// The operation was rejected.
    Error,
    /// The operation was rejected because of a programming or contract fault.
    Fatal,
}

/// A non-fatal condition reported alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Stable machine-readable code.
    pub code: String,
    /// Severity of the condition.
    pub severity: Severity,
    /// Human-readable detail.
    pub message: String,
}

impl Notice {
    /// Creates a warning-level notice.
    #[must_use]
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., concurrent modification).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// A classified domain error.
    #[error("{message}")]
    Domain {
        /// Stable machine-readable code.
        code: &'static str,
        /// Category used for the status code.
        category: ErrorCategory,
        /// Severity tag.
        severity: Severity,
        /// Detail including amounts or period names.
        message: String,
    },
}

impl AppError {
    /// Builds an error from a classified domain failure.
    #[must_use]
    pub fn domain(
        code: &'static str,
        category: ErrorCategory,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self::Domain {
            code,
            category,
            severity,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
            Self::Domain { category, .. } => match category {
                ErrorCategory::Contract => 400,
                ErrorCategory::BusinessRule => 422,
                ErrorCategory::NotFound => 404,
                ErrorCategory::Conflict => 409,
                ErrorCategory::Infrastructure => 500,
            },
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain { code, .. } => *code,
        }
    }

    /// Returns the severity tag for this error.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::NotFound(_) | Self::Validation(_) | Self::BusinessRule(_) | Self::Conflict(_) => {
                Severity::Error
            }
            Self::Database(_) | Self::Internal(_) => Severity::Fatal,
            Self::Domain { severity, .. } => *severity,
        }
    }
}
