//! Provider webhook endpoint.
//!
//! The provider redelivers any webhook that is not answered with a 2xx,
//! so this handler acknowledges every delivery, including malformed ones
//! and internal failures. Problems are logged, never surfaced upstream.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/webhooks/provider
pub async fn ingest(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let data = match state.engine.ingest_webhook(&body).await {
        Ok(disposition) => serde_json::to_value(disposition)
            .unwrap_or_else(|_| json!({ "acknowledged": true })),
        Err(e) => {
            tracing::error!(error = %e, "Webhook processing failed; acknowledging anyway");
            json!({ "acknowledged": true })
        }
    };

    (StatusCode::OK, Json(DataResponse { data }))
}
