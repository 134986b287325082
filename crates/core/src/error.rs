//! Classification shared by every domain error in this crate.

use backoffice_shared::{AppError, ErrorCategory, Severity};

/// A domain failure that knows its own code, category and severity.
///
/// Implemented by each module's error enum so callers never inspect
/// message text.
pub trait DomainError: std::error::Error {
    /// Stable machine-readable code.
    fn error_code(&self) -> &'static str;

    /// Broad category of the failure.
    fn category(&self) -> ErrorCategory;

    /// Severity tag. Contract violations are fatal to the operation.
    fn severity(&self) -> Severity {
        match self.category() {
            ErrorCategory::Contract | ErrorCategory::Infrastructure => Severity::Fatal,
            ErrorCategory::BusinessRule | ErrorCategory::NotFound | ErrorCategory::Conflict => {
                Severity::Error
            }
        }
    }

    /// Returns true if retrying the whole operation may succeed.
    fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }

    /// Converts into the HTTP-facing error, keeping the tags.
    fn to_app_error(&self) -> AppError {
        AppError::domain(
            self.error_code(),
            self.category(),
            self.severity(),
            self.to_string(),
        )
    }
}
