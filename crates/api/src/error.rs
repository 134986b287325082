//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use backoffice_db::StoreError;
use backoffice_shared::{AppError, Severity};
use serde_json::json;

/// An error rendered as `{"error", "message", "severity"}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// A malformed request the handler rejected before calling the core.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err.into())
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let severity = self.0.severity();

        // Infrastructure detail stays in the logs.
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.error_code(), "request failed");
            "An internal error occurred".to_string()
        } else {
            tracing::warn!(error = %self.0, code = self.0.error_code(), "request rejected");
            self.0.to_string()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
                "severity": severity_label(severity),
            })),
        )
            .into_response()
    }
}

const fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Fatal => "fatal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::inventory::InventoryError;
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_business_rule_renders_422_with_amounts() {
        let err: ApiError = StoreError::from(InventoryError::InsufficientStock {
            needed: Decimal::new(12, 0),
            available: Decimal::new(10, 0),
        })
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_of(response).await;
        assert_eq!(body["error"], "INSUFFICIENT_STOCK");
        assert_eq!(body["severity"], "error");
        assert_eq!(body["message"], "Insufficient stock: needed 12, available 10");
    }

    #[tokio::test]
    async fn test_database_errors_hide_detail() {
        let err = ApiError(AppError::Database("connection reset by peer".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["severity"], "fatal");
        assert_eq!(body["message"], "An internal error occurred");
    }
}
