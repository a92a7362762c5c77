//! Route definitions for monitored entities and their sync operations.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{entities, sync, tracking};
use crate::state::AppState;

/// Entity routes mounted at `/entities`.
///
/// ```text
/// GET    /                          -> list_entities
/// POST   /                          -> create_entity
/// GET    /{id}                      -> get_entity
/// GET    /{id}/processes            -> list_entity_processes
/// POST   /{id}/search               -> run_search
/// POST   /{id}/sync                 -> run_tracking_sync
/// POST   /{id}/tracking             -> activate
/// DELETE /{id}/tracking             -> deactivate
/// POST   /{id}/tracking/pause       -> pause
/// POST   /{id}/tracking/resume      -> resume
/// POST   /{id}/tracking/reactivate  -> reactivate
/// GET    /{id}/tracking/drift       -> drift
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(entities::list_entities).post(entities::create_entity),
        )
        .route("/{id}", get(entities::get_entity))
        .route("/{id}/processes", get(entities::list_entity_processes))
        .route("/{id}/search", post(sync::run_search))
        .route("/{id}/sync", post(sync::run_tracking_sync))
        .route(
            "/{id}/tracking",
            post(tracking::activate).delete(tracking::deactivate),
        )
        .route("/{id}/tracking/pause", post(tracking::pause))
        .route("/{id}/tracking/resume", post(tracking::resume))
        .route("/{id}/tracking/reactivate", post(tracking::reactivate))
        .route("/{id}/tracking/drift", get(tracking::drift))
}
