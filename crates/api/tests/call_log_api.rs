//! HTTP-level integration tests for the call audit-log listing.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

use lexsync_db::models::call_log::CreateCallLog;
use lexsync_db::repositories::CallLogRepo;

async fn seed_log_entry(pool: &PgPool, endpoint: &str) {
    CallLogRepo::record(
        pool,
        &CreateCallLog {
            tenant_id: common::TENANT,
            user_id: None,
            monitored_entity_id: None,
            call_kind: "submit".to_string(),
            endpoint: endpoint.to_string(),
            request_payload: None,
            job_id: Some("job-1".to_string()),
            success: true,
            http_status: Some(200),
            error_text: None,
            cost_estimate: 0.05,
        },
    )
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// Test: listing returns the tenant's entries newest first
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn lists_call_log_entries(pool: PgPool) {
    seed_log_entry(&pool, "requests").await;
    seed_log_entry(&pool, "responses").await;

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/call-logs").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let entries = json["data"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e["call_kind"] == "submit"));
}

// ---------------------------------------------------------------------------
// Test: out-of-range paging values are clamped, not a server error
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn negative_paging_params_are_clamped(pool: PgPool) {
    seed_log_entry(&pool, "requests").await;

    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/call-logs?limit=-1&offset=-5").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn oversized_limit_is_capped(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/call-logs?limit=100000").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
