// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

use lexsync_api::config::ServerConfig;
use lexsync_api::router::build_app_router;
use lexsync_api::state::AppState;
use lexsync_provider::{ProviderError, ProviderTransport};
use lexsync_sync::SyncEngine;

/// Tenant id used by the request helpers.
pub const TENANT: i64 = 1;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Transport stub for tests that never reach the provider (entity CRUD,
/// webhook deliveries with embedded payloads). Any actual call fails
/// loudly so an unexpected network dependency shows up as a test failure.
struct UnreachableTransport;

#[async_trait::async_trait]
impl ProviderTransport for UnreachableTransport {
    async fn submit_request(&self, _body: &Value) -> Result<Value, ProviderError> {
        Err(unexpected())
    }
    async fn request_status(&self, _job_id: &str) -> Result<Value, ProviderError> {
        Err(unexpected())
    }
    async fn response_page(
        &self,
        _job_id: &str,
        _page: u32,
        _page_size: u32,
    ) -> Result<Value, ProviderError> {
        Err(unexpected())
    }
    async fn tracking_state(&self, _tracking_id: &str) -> Result<Value, ProviderError> {
        Err(unexpected())
    }
    async fn create_tracking(&self, _body: &Value) -> Result<Value, ProviderError> {
        Ok(json!({ "tracking_id": "trk-test" }))
    }
    async fn delete_tracking(&self, _tracking_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

fn unexpected() -> ProviderError {
    ProviderError::Configuration("test transport called unexpectedly".into())
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let engine = SyncEngine::new(pool.clone(), Arc::new(UnreachableTransport));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        engine: Arc::new(engine),
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers (all attach the test tenant header)
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-tenant-id", TENANT.to_string())
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-tenant-id", TENANT.to_string())
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn patch_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-tenant-id", TENANT.to_string())
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("x-tenant-id", TENANT.to_string())
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
