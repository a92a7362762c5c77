//! Handlers for process timelines and the per-movement read flag.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use lexsync_core::error::CoreError;
use lexsync_core::types::DbId;
use lexsync_db::repositories::MovementRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::tenant::Tenant;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/processes/{id}/movements
///
/// Timeline in chronological ascending order.
pub async fn list_movements(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(process_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_process_owned(&state, ctx.tenant_id, process_id).await?;
    let movements = MovementRepo::list_for_process(&state.pool, process_id).await?;
    Ok(Json(DataResponse { data: movements }))
}

#[derive(Debug, Deserialize)]
pub struct SetRead {
    pub is_read: bool,
}

/// PATCH /api/v1/processes/{process_id}/movements/{id}/read
pub async fn set_read(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path((process_id, movement_id)): Path<(DbId, DbId)>,
    Json(input): Json<SetRead>,
) -> AppResult<impl IntoResponse> {
    ensure_process_owned(&state, ctx.tenant_id, process_id).await?;
    let updated = MovementRepo::set_read(&state.pool, movement_id, input.is_read).await?;
    if !updated {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "ProcessMovement",
            id: movement_id,
        }));
    }
    Ok(Json(DataResponse {
        data: serde_json::json!({ "is_read": input.is_read }),
    }))
}

/// Tenant-scoping check for process-level routes.
async fn ensure_process_owned(
    state: &AppState,
    tenant_id: DbId,
    process_id: DbId,
) -> AppResult<()> {
    let owned: Option<(DbId,)> =
        sqlx::query_as("SELECT id FROM legal_processes WHERE id = $1 AND tenant_id = $2")
            .bind(process_id)
            .bind(tenant_id)
            .fetch_optional(&state.pool)
            .await?;
    if owned.is_none() {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "LegalProcess",
            id: process_id,
        }));
    }
    Ok(())
}
