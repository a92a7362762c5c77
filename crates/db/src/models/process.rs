//! Legal process models.

use serde::Serialize;
use sqlx::FromRow;

use lexsync_core::normalize::NormalizedProcess;
use lexsync_core::{DbId, Timestamp};

/// A row from the `legal_processes` table.
///
/// Natural key: `(monitored_entity_id, case_number)`, enforced by the
/// `uq_legal_processes_natural_key` constraint.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LegalProcess {
    pub id: DbId,
    pub tenant_id: DbId,
    pub monitored_entity_id: DbId,
    pub case_number: String,
    pub active_party: Option<String>,
    pub passive_party: Option<String>,
    pub court_name: Option<String>,
    pub court_acronym: Option<String>,
    pub phase: Option<String>,
    pub status: Option<String>,
    pub filing_value: Option<f64>,
    /// Raw captured payload, kept verbatim for audit and re-derivation.
    pub raw_payload: serde_json::Value,
    pub details_loaded: bool,
    pub manually_imported: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Upsert input built from a normalized projection plus ownership context.
#[derive(Debug)]
pub struct UpsertProcess<'a> {
    pub tenant_id: DbId,
    pub monitored_entity_id: DbId,
    pub normalized: &'a NormalizedProcess,
    pub manually_imported: bool,
}
