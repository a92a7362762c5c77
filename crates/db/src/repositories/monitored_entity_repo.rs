//! Repository for the `monitored_entities` table.

use sqlx::PgPool;

use lexsync_core::tracking::TrackingStatus;
use lexsync_core::{DbId, Timestamp};

use crate::models::monitored_entity::{CreateMonitoredEntity, MonitoredEntity};

/// Column list for `monitored_entities` queries.
const COLUMNS: &str = "\
    id, tenant_id, entity_kind, entity_key, display_name, \
    tracking_id, tracking_status, recurrence_days, \
    last_resolved_job_id, last_notified_at, received_records, \
    process_count, created_at, updated_at";

/// Provides CRUD and tracking-state operations for monitored entities.
pub struct MonitoredEntityRepo;

impl MonitoredEntityRepo {
    /// Register a new monitored entity for a tenant.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        input: &CreateMonitoredEntity,
    ) -> Result<MonitoredEntity, sqlx::Error> {
        let query = format!(
            "INSERT INTO monitored_entities \
                 (tenant_id, entity_kind, entity_key, display_name, recurrence_days) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MonitoredEntity>(&query)
            .bind(tenant_id)
            .bind(&input.entity_kind)
            .bind(&input.entity_key)
            .bind(&input.display_name)
            .bind(input.recurrence_days.unwrap_or(1))
            .fetch_one(pool)
            .await
    }

    /// Find an entity by id, scoped to a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<MonitoredEntity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM monitored_entities WHERE id = $1 AND tenant_id = $2");
        sqlx::query_as::<_, MonitoredEntity>(&query)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// Correlate a webhook event to an entity by its provider subscription id.
    pub async fn find_by_tracking_id(
        pool: &PgPool,
        tracking_id: &str,
    ) -> Result<Option<MonitoredEntity>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM monitored_entities WHERE tracking_id = $1");
        sqlx::query_as::<_, MonitoredEntity>(&query)
            .bind(tracking_id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's entities, newest first.
    pub async fn list_by_tenant(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<Vec<MonitoredEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM monitored_entities \
             WHERE tenant_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, MonitoredEntity>(&query)
            .bind(tenant_id)
            .fetch_all(pool)
            .await
    }

    /// Entities whose tracking subscription is due for a scheduled sync:
    /// pollable status and recurrence interval elapsed (or never synced).
    pub async fn list_due_for_sync(pool: &PgPool) -> Result<Vec<MonitoredEntity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM monitored_entities \
             WHERE tracking_id IS NOT NULL \
               AND tracking_status IN ($1, $2) \
               AND (last_notified_at IS NULL \
                    OR last_notified_at < NOW() - recurrence_days * INTERVAL '1 day') \
             ORDER BY last_notified_at ASC NULLS FIRST"
        );
        sqlx::query_as::<_, MonitoredEntity>(&query)
            .bind(TrackingStatus::Pendente.as_str())
            .bind(TrackingStatus::Ativo.as_str())
            .fetch_all(pool)
            .await
    }

    /// Attach a provider subscription id after activation.
    pub async fn set_tracking(
        pool: &PgPool,
        id: DbId,
        tracking_id: &str,
        recurrence_days: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE monitored_entities \
             SET tracking_id = $2, recurrence_days = $3, tracking_status = $4, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(tracking_id)
        .bind(recurrence_days)
        .bind(TrackingStatus::Pendente.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Clear tracking fields after provider-side teardown.
    pub async fn clear_tracking(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE monitored_entities \
             SET tracking_id = NULL, last_resolved_job_id = NULL, \
                 tracking_status = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(TrackingStatus::Pendente.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Write a validated tracking status.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: TrackingStatus,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE monitored_entities SET tracking_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Advance the subscription after a successful resolve: record the new
    /// job id, bump the received-record counter, stamp the notify time,
    /// and activate if this was the first resolve.
    pub async fn advance_subscription(
        pool: &PgPool,
        id: DbId,
        job_id: &str,
        received: i64,
        notified_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE monitored_entities \
             SET last_resolved_job_id = $2, \
                 received_records = received_records + $3, \
                 last_notified_at = $4, \
                 tracking_status = $5, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(job_id)
        .bind(received)
        .bind(notified_at)
        .bind(TrackingStatus::Ativo.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Stamp the notify time without advancing the job pointer, so an
    /// unchanged subscription is not re-polled until the next recurrence.
    pub async fn mark_checked(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE monitored_entities SET last_notified_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Recompute the derived `process_count` aggregate by counting owned rows.
    pub async fn recount_processes(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "UPDATE monitored_entities \
             SET process_count = ( \
                 SELECT COUNT(*) FROM legal_processes WHERE monitored_entity_id = $1 \
             ), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING process_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
