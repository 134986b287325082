//! Router tests for request parsing paths. The database handle is
//! disconnected, so anything reaching storage fails as infrastructure.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use backoffice_api::middleware::{ACTOR_HEADER, BUSINESS_HEADER};
use backoffice_api::{AppState, create_router};
use backoffice_db::Operations;
use backoffice_shared::AppConfig;
use backoffice_shared::config::{
    DatabaseConfig, InventoryConfig, LedgerConfig, ServerConfig, SweeperConfig,
};
use backoffice_shared::types::{BusinessId, UserId};
use http_body_util::BodyExt;
use rstest::rstest;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let config = AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        ledger: LedgerConfig::default(),
        inventory: InventoryConfig::default(),
        sweeper: SweeperConfig::default(),
    };
    let ops = Operations::new(DatabaseConnection::Disconnected, &config);
    create_router(AppState::new(ops))
}

fn with_actor(builder: axum::http::request::Builder) -> axum::http::request::Builder {
    builder
        .header(BUSINESS_HEADER, BusinessId::new().to_string())
        .header(ACTOR_HEADER, UserId::new().to_string())
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn posting() -> Value {
    json!({
        "transaction_date": "2024-03-15",
        "description": "Cash sale",
        "reference_type": "manual",
        "lines": [
            { "account_code": "1000", "debit": "100.00" },
            { "account_code": "4000", "credit": "100.00" }
        ]
    })
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let response = app()
        .oneshot(Request::get("/api/v1/health/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["status"], "unavailable");
}

#[tokio::test]
async fn test_missing_actor_headers_rejected() {
    let request = Request::post("/api/v1/ledger/entries")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(posting().to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["severity"], "error");
    assert!(body["message"].as_str().unwrap().contains(BUSINESS_HEADER));
}

#[tokio::test]
async fn test_body_missing_fields_rejected() {
    let request = with_actor(Request::post("/api/v1/ledger/entries"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "description": "no lines" }).to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[rstest]
#[case("/api/v1/reports/trial-balance?as_of=yesterday")]
#[case("/api/v1/reports/trial-balance?as_of=2024-02-30")]
#[tokio::test]
async fn test_bad_report_date_rejected(#[case] uri: &str) {
    let request = with_actor(Request::get(uri)).body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_storage_failure_renders_fatal() {
    let request = with_actor(Request::post("/api/v1/ledger/entries"))
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(posting().to_string()))
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["error"], "DATABASE_ERROR");
    assert_eq!(body["severity"], "fatal");
}

#[tokio::test]
async fn test_path_ids_must_be_uuids() {
    let request = with_actor(Request::post("/api/v1/credit-notes/CN-000001/cancel"))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
