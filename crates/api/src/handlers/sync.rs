//! Handlers for on-demand synchronization.
//!
//! Both endpoints run the sync inline and return the engine's report.
//! Retryable conditions (provider exhaustion) are surfaced as 503 so
//! clients can distinguish "try again later" from a hard failure.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use lexsync_core::types::DbId;
use lexsync_sync::SyncReport;

use crate::error::AppResult;
use crate::middleware::tenant::Tenant;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/entities/{id}/search
///
/// Submit a fresh provider search for the entity and reconcile the
/// results before responding.
pub async fn run_search(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = state.engine.run_search(ctx, entity_id).await?;
    Ok(report_response(report))
}

/// POST /api/v1/entities/{id}/sync
///
/// Resolve the entity's tracking subscription now, outside the regular
/// schedule.
pub async fn run_tracking_sync(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let report = state.engine.run_tracking_sync(ctx, entity_id).await?;
    Ok(report_response(report))
}

/// Map a sync report to a response status. Reports are data, not errors,
/// but the status code still signals retryability to clients.
fn report_response(report: SyncReport) -> impl IntoResponse {
    let status = match &report {
        SyncReport::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        SyncReport::TimedOut => StatusCode::ACCEPTED,
        _ => StatusCode::OK,
    };
    (status, Json(DataResponse { data: report }))
}
