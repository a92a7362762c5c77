//! Monitored entity models: one row per identity under watch, with the
//! tracking-subscription fields embedded.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use lexsync_core::tracking::TrackingStatus;
use lexsync_core::{CoreError, DbId, Timestamp};

/// A row from the `monitored_entities` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MonitoredEntity {
    pub id: DbId,
    pub tenant_id: DbId,
    /// Search type for this identity: `oab`, `cnpj`, or `lawsuit_cnj`.
    pub entity_kind: String,
    /// The identity itself (registration number, tax id, case number).
    pub entity_key: String,
    pub display_name: Option<String>,
    /// Provider-assigned subscription id, once tracking is activated.
    pub tracking_id: Option<String>,
    /// Stored as text; parse via [`MonitoredEntity::tracking_status`].
    #[sqlx(rename = "tracking_status")]
    #[serde(rename = "tracking_status")]
    pub tracking_status_raw: String,
    pub recurrence_days: i32,
    /// Most recent job id this subscription was successfully advanced to.
    pub last_resolved_job_id: Option<String>,
    pub last_notified_at: Option<Timestamp>,
    /// Cumulative count of records received through this subscription.
    pub received_records: i64,
    /// Derived aggregate, recomputed by the reconciler after every sync.
    pub process_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MonitoredEntity {
    /// Typed view of the stored tracking status.
    pub fn tracking_status(&self) -> Result<TrackingStatus, CoreError> {
        TrackingStatus::parse(&self.tracking_status_raw)
    }
}

/// DTO for registering a new monitored entity.
#[derive(Debug, Deserialize)]
pub struct CreateMonitoredEntity {
    pub entity_kind: String,
    pub entity_key: String,
    pub display_name: Option<String>,
    /// Tracking recurrence in days. Defaults to 1.
    pub recurrence_days: Option<i32>,
}
