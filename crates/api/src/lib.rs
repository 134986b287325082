//! HTTP API layer with Axum routes and extractors.
//!
//! This crate provides:
//! - REST routes over the `Operations` facade
//! - The `ActorContext` extractor for gateway-supplied identity headers
//! - A uniform JSON error body

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use backoffice_db::Operations;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use middleware::ActorContext;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Transactional facade over the database.
    pub ops: Operations,
}

impl AppState {
    /// Wraps an operations facade.
    #[must_use]
    pub const fn new(ops: Operations) -> Self {
        Self { ops }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
