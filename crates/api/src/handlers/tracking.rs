//! Handlers for the tracking-subscription lifecycle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use lexsync_core::types::DbId;

use crate::error::{AppError, AppResult};
use crate::middleware::tenant::Tenant;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActivateTracking {
    /// Polling recurrence in days. Defaults to 1.
    pub recurrence_days: Option<i32>,
}

/// POST /api/v1/entities/{id}/tracking
///
/// Activate monitoring: create the provider-side subscription.
pub async fn activate(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
    Json(input): Json<ActivateTracking>,
) -> AppResult<impl IntoResponse> {
    let recurrence_days = input.recurrence_days.unwrap_or(1);
    if recurrence_days < 1 {
        return Err(AppError::BadRequest(
            "recurrence_days must be at least 1".into(),
        ));
    }

    let tracking_id = state
        .engine
        .activate_tracking(ctx, entity_id, recurrence_days)
        .await?;
    tracing::info!(entity_id, %tracking_id, "Tracking activated");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: json!({ "tracking_id": tracking_id }),
        }),
    ))
}

/// DELETE /api/v1/entities/{id}/tracking
pub async fn deactivate(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.engine.deactivate_tracking(ctx, entity_id).await?;
    tracing::info!(entity_id, "Tracking deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/entities/{id}/tracking/pause
pub async fn pause(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.engine.pause_tracking(ctx, entity_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/entities/{id}/tracking/resume
pub async fn resume(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.engine.resume_tracking(ctx, entity_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/entities/{id}/tracking/reactivate
///
/// Send a subscription in `erro` back through `pendente`.
pub async fn reactivate(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.engine.reactivate_tracking(ctx, entity_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/entities/{id}/tracking/drift
///
/// Diagnostic comparing the stored job id with the provider's current one.
pub async fn drift(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let drift = state.engine.tracking_drift(ctx, entity_id).await?;
    Ok(Json(DataResponse { data: drift }))
}
