//! Reconciler: idempotent persistence of normalized projections.
//!
//! Insert-vs-update is decided by the store in one atomic upsert on the
//! natural key, so two concurrent invocations for the same monitored
//! entity (a manual reconsult racing a scheduled sync) can never produce
//! duplicate process rows. Movements insert through the dedup key and
//! silently skip content already captured.

use sqlx::PgPool;

use lexsync_core::normalize::NormalizedProcess;
use lexsync_core::types::TenantContext;
use lexsync_core::DbId;
use lexsync_db::models::process::UpsertProcess;
use lexsync_db::repositories::{MonitoredEntityRepo, MovementRepo, ProcessRepo};

use crate::error::SyncError;

/// Per-process persistence outcome.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileStats {
    pub process_id: DbId,
    pub movements_inserted: usize,
    pub movements_skipped: usize,
}

/// Persists normalized processes and movements for one monitored entity.
pub struct Reconciler;

impl Reconciler {
    /// Reconcile one normalized process: upsert the process row, append
    /// unseen movements, and recompute the owner's process counter.
    pub async fn apply(
        pool: &PgPool,
        ctx: TenantContext,
        monitored_entity_id: DbId,
        normalized: &NormalizedProcess,
    ) -> Result<ReconcileStats, SyncError> {
        let process = ProcessRepo::upsert(
            pool,
            &UpsertProcess {
                tenant_id: ctx.tenant_id,
                monitored_entity_id,
                normalized,
                manually_imported: false,
            },
        )
        .await?;

        let mut inserted = 0;
        let mut skipped = 0;
        for movement in &normalized.movements {
            if MovementRepo::insert(pool, process.id, movement).await? {
                inserted += 1;
            } else {
                skipped += 1;
            }
        }

        MonitoredEntityRepo::recount_processes(pool, monitored_entity_id).await?;

        tracing::debug!(
            process_id = process.id,
            case_number = %normalized.case_number,
            movements_inserted = inserted,
            movements_skipped = skipped,
            "Process reconciled",
        );

        Ok(ReconcileStats {
            process_id: process.id,
            movements_inserted: inserted,
            movements_skipped: skipped,
        })
    }
}
