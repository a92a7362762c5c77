//! Process movement (timeline entry) models.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use lexsync_core::{DbId, Timestamp};

/// A row from the `process_movements` table.
///
/// Content is immutable once captured; only the tenant-local `is_read`
/// flag is ever mutated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProcessMovement {
    pub id: DbId,
    pub process_id: DbId,
    pub movement_date: NaiveDate,
    pub movement_type: Option<String>,
    pub description: String,
    pub raw_step: serde_json::Value,
    pub is_read: bool,
    pub dedup_hash: String,
    pub created_at: Timestamp,
}
