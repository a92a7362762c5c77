//! Repository for the `legal_processes` table.
//!
//! The central operation is [`ProcessRepo::upsert`]: a single atomic
//! `INSERT ... ON CONFLICT ... DO UPDATE` on the natural key, safe under
//! concurrent writers (a manual reconsult racing a scheduled sync must
//! never produce duplicate rows).

use sqlx::PgPool;

use lexsync_core::DbId;

use crate::models::process::{LegalProcess, UpsertProcess};

/// Column list for `legal_processes` queries.
const COLUMNS: &str = "\
    id, tenant_id, monitored_entity_id, case_number, \
    active_party, passive_party, court_name, court_acronym, \
    phase, status, filing_value, raw_payload, \
    details_loaded, manually_imported, created_at, updated_at";

/// Provides idempotent persistence for legal processes.
pub struct ProcessRepo;

impl ProcessRepo {
    /// Insert-or-update by natural key `(monitored_entity_id, case_number)`.
    ///
    /// Update semantics guard against partial provider responses
    /// regressing a previously complete record:
    /// - party/court/status fields only overwrite when the new value is
    ///   non-empty;
    /// - the raw payload is only replaced when the new payload is at
    ///   least as large as the stored one (a sealed-case re-sight returns
    ///   a near-empty cover and must not clobber captured history);
    /// - `details_loaded` latches true and never falls back to false.
    pub async fn upsert(pool: &PgPool, input: &UpsertProcess<'_>) -> Result<LegalProcess, sqlx::Error> {
        let n = input.normalized;
        let query = format!(
            "INSERT INTO legal_processes \
                 (tenant_id, monitored_entity_id, case_number, \
                  active_party, passive_party, court_name, court_acronym, \
                  phase, status, filing_value, raw_payload, \
                  details_loaded, manually_imported) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (monitored_entity_id, case_number) DO UPDATE SET \
                 active_party  = COALESCE(NULLIF(EXCLUDED.active_party, ''), legal_processes.active_party), \
                 passive_party = COALESCE(NULLIF(EXCLUDED.passive_party, ''), legal_processes.passive_party), \
                 court_name    = COALESCE(EXCLUDED.court_name, legal_processes.court_name), \
                 court_acronym = COALESCE(EXCLUDED.court_acronym, legal_processes.court_acronym), \
                 phase         = COALESCE(EXCLUDED.phase, legal_processes.phase), \
                 status        = COALESCE(EXCLUDED.status, legal_processes.status), \
                 filing_value  = COALESCE(EXCLUDED.filing_value, legal_processes.filing_value), \
                 raw_payload   = CASE \
                     WHEN pg_column_size(EXCLUDED.raw_payload) >= pg_column_size(legal_processes.raw_payload) \
                     THEN EXCLUDED.raw_payload \
                     ELSE legal_processes.raw_payload \
                 END, \
                 details_loaded = legal_processes.details_loaded OR EXCLUDED.details_loaded, \
                 updated_at = NOW() \
             RETURNING {COLUMNS}"
        );

        sqlx::query_as::<_, LegalProcess>(&query)
            .bind(input.tenant_id)
            .bind(input.monitored_entity_id)
            .bind(&n.case_number)
            .bind(&n.active_party)
            .bind(&n.passive_party)
            .bind(&n.court_name)
            .bind(&n.court_acronym)
            .bind(&n.phase)
            .bind(&n.status)
            .bind(n.filing_value)
            .bind(&n.raw)
            .bind(n.details_complete)
            .bind(input.manually_imported)
            .fetch_one(pool)
            .await
    }

    /// Find a process by its natural key.
    pub async fn find_by_natural_key(
        pool: &PgPool,
        monitored_entity_id: DbId,
        case_number: &str,
    ) -> Result<Option<LegalProcess>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM legal_processes \
             WHERE monitored_entity_id = $1 AND case_number = $2"
        );
        sqlx::query_as::<_, LegalProcess>(&query)
            .bind(monitored_entity_id)
            .bind(case_number)
            .fetch_optional(pool)
            .await
    }

    /// List all processes for one monitored entity, newest sighting first.
    pub async fn list_for_entity(
        pool: &PgPool,
        monitored_entity_id: DbId,
    ) -> Result<Vec<LegalProcess>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM legal_processes \
             WHERE monitored_entity_id = $1 ORDER BY updated_at DESC"
        );
        sqlx::query_as::<_, LegalProcess>(&query)
            .bind(monitored_entity_id)
            .fetch_all(pool)
            .await
    }
}
