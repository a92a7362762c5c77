pub mod entities;
pub mod health;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{call_logs, movements, webhooks};
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /entities                                 list, register
/// /entities/{id}                            get
/// /entities/{id}/processes                  captured processes
/// /entities/{id}/search                     run a fresh search (POST)
/// /entities/{id}/sync                       sync the subscription now (POST)
/// /entities/{id}/tracking                   activate (POST), deactivate (DELETE)
/// /entities/{id}/tracking/pause             pause polling (POST)
/// /entities/{id}/tracking/resume            resume polling (POST)
/// /entities/{id}/tracking/reactivate        recover from erro (POST)
/// /entities/{id}/tracking/drift             stored vs provider job id (GET)
///
/// /processes/{id}/movements                 timeline (GET)
/// /processes/{pid}/movements/{id}/read      read flag (PATCH)
///
/// /call-logs                                audit trail (GET)
///
/// /webhooks/provider                        provider push endpoint (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/entities", entities::router())
        .route("/processes/{id}/movements", get(movements::list_movements))
        .route(
            "/processes/{process_id}/movements/{id}/read",
            patch(movements::set_read),
        )
        .route("/call-logs", get(call_logs::list_call_logs))
        .route("/webhooks/provider", post(webhooks::ingest))
}
