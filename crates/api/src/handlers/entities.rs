//! Handlers for monitored-entity registration and listing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use lexsync_core::error::CoreError;
use lexsync_core::types::DbId;
use lexsync_db::models::monitored_entity::CreateMonitoredEntity;
use lexsync_db::repositories::{MonitoredEntityRepo, ProcessRepo};
use lexsync_provider::SearchType;

use crate::error::{AppError, AppResult};
use crate::middleware::tenant::Tenant;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/entities
///
/// Register a new monitored entity (an OAB number, a CNPJ, or a single
/// case number) for the caller's tenant.
pub async fn create_entity(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Json(input): Json<CreateMonitoredEntity>,
) -> AppResult<impl IntoResponse> {
    SearchType::parse(&input.entity_kind)
        .map_err(|_| AppError::BadRequest(format!("Unknown entity kind: {}", input.entity_kind)))?;
    if input.entity_key.trim().is_empty() {
        return Err(AppError::BadRequest("entity_key must not be empty".into()));
    }
    if let Some(days) = input.recurrence_days {
        if days < 1 {
            return Err(AppError::BadRequest(
                "recurrence_days must be at least 1".into(),
            ));
        }
    }

    let entity = MonitoredEntityRepo::create(&state.pool, ctx.tenant_id, &input).await?;
    tracing::info!(
        entity_id = entity.id,
        tenant_id = ctx.tenant_id,
        kind = %entity.entity_kind,
        "Monitored entity registered",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: entity })))
}

/// GET /api/v1/entities
pub async fn list_entities(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let entities = MonitoredEntityRepo::list_by_tenant(&state.pool, ctx.tenant_id).await?;
    Ok(Json(DataResponse { data: entities }))
}

/// GET /api/v1/entities/{id}
pub async fn get_entity(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entity = MonitoredEntityRepo::find_by_id(&state.pool, ctx.tenant_id, entity_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "MonitoredEntity",
            id: entity_id,
        }))?;
    Ok(Json(DataResponse { data: entity }))
}

/// GET /api/v1/entities/{id}/processes
///
/// List the legal processes captured for one monitored entity.
pub async fn list_entity_processes(
    Tenant(ctx): Tenant,
    State(state): State<AppState>,
    Path(entity_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    // Ownership check before listing.
    MonitoredEntityRepo::find_by_id(&state.pool, ctx.tenant_id, entity_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "MonitoredEntity",
            id: entity_id,
        }))?;

    let processes = ProcessRepo::list_for_entity(&state.pool, entity_id).await?;
    Ok(Json(DataResponse { data: processes }))
}
