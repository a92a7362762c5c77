//! Repository for the `process_movements` table.
//!
//! Movement content is immutable once captured. Inserts go through
//! `ON CONFLICT DO NOTHING` on the `(process_id, dedup_hash)` key, so
//! re-processing the same provider job is a no-op at the timeline level.

use sqlx::PgPool;

use lexsync_core::normalize::NormalizedMovement;
use lexsync_core::DbId;

use crate::models::movement::ProcessMovement;

/// Column list for `process_movements` queries.
const COLUMNS: &str = "\
    id, process_id, movement_date, movement_type, description, \
    raw_step, is_read, dedup_hash, created_at";

/// Provides append-and-annotate operations for timeline entries.
pub struct MovementRepo;

impl MovementRepo {
    /// Insert one movement, ignoring duplicates.
    ///
    /// Returns `true` when a row was actually inserted, `false` when the
    /// dedup key already existed.
    pub async fn insert(
        pool: &PgPool,
        process_id: DbId,
        movement: &NormalizedMovement,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO process_movements \
                 (process_id, movement_date, movement_type, description, raw_step, dedup_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (process_id, dedup_hash) DO NOTHING",
        )
        .bind(process_id)
        .bind(movement.movement_date)
        .bind(&movement.movement_type)
        .bind(&movement.description)
        .bind(&movement.raw)
        .bind(&movement.dedup_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List a process's timeline in chronological ascending order.
    pub async fn list_for_process(
        pool: &PgPool,
        process_id: DbId,
    ) -> Result<Vec<ProcessMovement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM process_movements \
             WHERE process_id = $1 ORDER BY movement_date ASC, id ASC"
        );
        sqlx::query_as::<_, ProcessMovement>(&query)
            .bind(process_id)
            .fetch_all(pool)
            .await
    }

    /// Toggle the tenant-local read flag. Returns `false` if the movement
    /// does not exist.
    pub async fn set_read(pool: &PgPool, id: DbId, is_read: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE process_movements SET is_read = $2 WHERE id = $1")
            .bind(id)
            .bind(is_read)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
