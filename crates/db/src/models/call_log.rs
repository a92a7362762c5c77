//! Append-only audit records for outbound provider calls.

use serde::Serialize;
use sqlx::FromRow;

use lexsync_core::{DbId, Timestamp};

/// A row from the `api_call_logs` table. Never mutated after insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApiCallLog {
    pub id: DbId,
    pub tenant_id: DbId,
    pub user_id: Option<DbId>,
    pub monitored_entity_id: Option<DbId>,
    /// Call category: `submit`, `poll`, `tracking_state`, ...
    pub call_kind: String,
    pub endpoint: String,
    pub request_payload: Option<serde_json::Value>,
    /// Provider job id resulting from or referenced by the call.
    pub job_id: Option<String>,
    pub success: bool,
    pub http_status: Option<i32>,
    pub error_text: Option<String>,
    pub cost_estimate: f64,
    pub created_at: Timestamp,
}

/// Insert input for one audit record.
#[derive(Debug, Clone)]
pub struct CreateCallLog {
    pub tenant_id: DbId,
    pub user_id: Option<DbId>,
    pub monitored_entity_id: Option<DbId>,
    pub call_kind: String,
    pub endpoint: String,
    pub request_payload: Option<serde_json::Value>,
    pub job_id: Option<String>,
    pub success: bool,
    pub http_status: Option<i32>,
    pub error_text: Option<String>,
    pub cost_estimate: f64,
}
