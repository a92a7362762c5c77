//! Handlers for the provider call audit log.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use lexsync_db::repositories::CallLogRepo;

use crate::error::AppResult;
use crate::middleware::tenant::Tenant;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallLogParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/call-logs
///
/// The tenant's outbound-call audit trail, newest first.
pub async fn list_call_logs(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Query(params): Query<CallLogParams>,
) -> AppResult<impl IntoResponse> {
    let logs =
        CallLogRepo::list_by_tenant(&state.pool, ctx.tenant_id, params.limit, params.offset)
            .await?;
    Ok(Json(DataResponse { data: logs }))
}
