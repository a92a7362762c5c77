//! HTTP-level integration tests for the `/entities` API endpoints.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, get, post_json};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

fn new_entity(kind: &str, key: &str) -> serde_json::Value {
    json!({
        "entity_kind": kind,
        "entity_key": key,
        "display_name": "Test entity",
        "recurrence_days": 1,
    })
}

// ---------------------------------------------------------------------------
// Test: POST /api/v1/entities registers an entity
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn create_entity_returns_created(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/entities",
        new_entity("oab", "123456-PR"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["data"]["entity_kind"], "oab");
    assert_eq!(json["data"]["entity_key"], "123456-PR");
    assert_eq!(json["data"]["tracking_status"], "pendente");
    assert_eq!(json["data"]["process_count"], 0);
}

// ---------------------------------------------------------------------------
// Test: duplicate registration is a 409
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_entity_returns_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app.clone(),
        "/api/v1/entities",
        new_entity("cnpj", "12.345.678/0001-90"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(
        app,
        "/api/v1/entities",
        new_entity("cnpj", "12.345.678/0001-90"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Test: unknown entity kind is rejected
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_entity_kind_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/entities",
        new_entity("cpf", "000.000.000-00"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: missing tenant header is rejected
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn missing_tenant_header_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);
    let request = Request::builder()
        .method("GET")
        .uri("/api/v1/entities")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Test: GET list and GET by id
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn list_and_get_entities(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/entities",
        new_entity("lawsuit_cnj", "0045144-39.2025.8.16.0021"),
    )
    .await;
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = get(app.clone(), "/api/v1/entities").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = get(app.clone(), &format!("/api/v1/entities/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(app, "/api/v1/entities/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: processes listing is tenant-scoped
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn entity_processes_start_empty(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/entities",
        new_entity("oab", "7777-SP"),
    )
    .await;
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let response = get(app, &format!("/api/v1/entities/{id}/processes")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
