//! Tenant attribution extractor for Axum handlers.
//!
//! Authentication terminates at the gateway in front of this service; by
//! the time a request arrives here, the caller has been resolved to a
//! tenant (and optionally an acting user) carried in trusted headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use lexsync_core::types::{DbId, TenantContext};

use crate::error::AppError;
use crate::state::AppState;

/// Tenant context extracted from the `x-tenant-id` / `x-user-id` headers.
///
/// Use this as an extractor parameter in any handler that operates on
/// tenant-owned data:
///
/// ```ignore
/// async fn my_handler(Tenant(ctx): Tenant) -> AppResult<Json<()>> {
///     tracing::info!(tenant_id = ctx.tenant_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Tenant(pub TenantContext);

impl FromRequestParts<AppState> for Tenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let tenant_id: DbId = parts
            .headers
            .get("x-tenant-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                AppError::BadRequest("Missing or invalid x-tenant-id header".into())
            })?;

        let user_id: Option<DbId> = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        Ok(Tenant(match user_id {
            Some(user_id) => TenantContext::with_user(tenant_id, user_id),
            None => TenantContext::new(tenant_id),
        }))
    }
}
