//! Liveness and readiness probes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::AppState;

/// Probe body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy`, `ready` or `unavailable`.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

impl HealthResponse {
    const fn new(status: &'static str) -> Self {
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// The process is up. Never touches the database.
async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse::new("healthy"))
}

/// The database answers a ping; 503 otherwise.
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.ops.db().ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::new("ready"))),
        Err(err) => {
            tracing::warn!(error = %err, "readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse::new("unavailable")),
            )
        }
    }
}

/// Probe routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(liveness))
        .route("/health/ready", get(readiness))
}
