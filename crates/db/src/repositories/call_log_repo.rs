//! Repository for the append-only `api_call_logs` table.

use sqlx::PgPool;

use lexsync_core::DbId;

use crate::models::call_log::{ApiCallLog, CreateCallLog};

/// Column list for `api_call_logs` queries.
const COLUMNS: &str = "\
    id, tenant_id, user_id, monitored_entity_id, call_kind, endpoint, \
    request_payload, job_id, success, http_status, error_text, \
    cost_estimate, created_at";

/// Maximum page size for call-log listing.
const MAX_LIMIT: i64 = 200;

/// Default page size for call-log listing.
const DEFAULT_LIMIT: i64 = 50;

/// Append-only audit log of outbound provider calls.
pub struct CallLogRepo;

impl CallLogRepo {
    /// Record one outbound call. Rows are never mutated afterwards.
    pub async fn record(pool: &PgPool, input: &CreateCallLog) -> Result<DbId, sqlx::Error> {
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO api_call_logs \
                 (tenant_id, user_id, monitored_entity_id, call_kind, endpoint, \
                  request_payload, job_id, success, http_status, error_text, cost_estimate) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING id",
        )
        .bind(input.tenant_id)
        .bind(input.user_id)
        .bind(input.monitored_entity_id)
        .bind(&input.call_kind)
        .bind(&input.endpoint)
        .bind(&input.request_payload)
        .bind(&input.job_id)
        .bind(input.success)
        .bind(input.http_status)
        .bind(&input.error_text)
        .bind(input.cost_estimate)
        .fetch_one(pool)
        .await?;
        Ok(id)
    }

    /// List a tenant's call log, newest first.
    pub async fn list_by_tenant(
        pool: &PgPool,
        tenant_id: DbId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ApiCallLog>, sqlx::Error> {
        // Caller-supplied paging values are clamped rather than rejected;
        // Postgres errors on a negative LIMIT or OFFSET.
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        let query = format!(
            "SELECT {COLUMNS} FROM api_call_logs \
             WHERE tenant_id = $1 \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ApiCallLog>(&query)
            .bind(tenant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Most recent call that produced or referenced the given provider
    /// job id. Used to correlate one-off-job webhooks back to an entity.
    pub async fn find_latest_by_job_id(
        pool: &PgPool,
        job_id: &str,
    ) -> Result<Option<ApiCallLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM api_call_logs \
             WHERE job_id = $1 ORDER BY created_at DESC LIMIT 1"
        );
        sqlx::query_as::<_, ApiCallLog>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }
}
