//! Response normalization: raw provider result items to canonical
//! process/movement projections.
//!
//! The provider's result shape varies by search type and by court
//! instance, so every field is read through ordered alias lists
//! ([`fields`]), party roles are inferred via a strict fallback chain
//! ([`parties`]), and timeline entries are normalized to ascending order
//! with a content dedup key ([`movements`]).

pub mod fields;
pub mod movements;
pub mod parties;

use serde_json::Value;

use crate::error::CoreError;

pub use movements::{extract_movements, movement_dedup_hash, NormalizedMovement};
pub use parties::{
    infer_parties, PartyRoles, INTERESTED_PARTY_SENTINEL, SECOND_INSTANCE_SENTINEL,
};

/// Aliases for the case number (CNJ-formatted natural key component).
const CASE_NUMBER_KEYS: &[&str] = &["code", "lawsuit_cnj", "case_number", "numero_processo"];

/// Aliases for the court's full name.
const COURT_NAME_KEYS: &[&str] = &["tribunal", "court", "court_name", "orgao_julgador"];

/// Aliases for the court's acronym.
const COURT_ACRONYM_KEYS: &[&str] = &["tribunal_acronym", "court_acronym", "sigla_tribunal"];

/// Aliases for the procedural phase.
const PHASE_KEYS: &[&str] = &["phase", "fase"];

/// Aliases for the procedural status.
const STATUS_KEYS: &[&str] = &["status", "situacao", "situação"];

/// Aliases for the filing value.
const FILING_VALUE_KEYS: &[&str] = &["amount", "value", "valor_causa", "valor"];

/// Canonical projection of one legal process from one raw result item.
#[derive(Debug, Clone)]
pub struct NormalizedProcess {
    pub case_number: String,
    pub active_party: String,
    pub passive_party: String,
    pub court_name: Option<String>,
    pub court_acronym: Option<String>,
    pub phase: Option<String>,
    pub status: Option<String>,
    pub filing_value: Option<f64>,
    /// Raw item kept verbatim for audit and re-derivation.
    pub raw: Value,
    /// False for sealed/restricted responses that carried only the cover.
    pub details_complete: bool,
    pub movements: Vec<NormalizedMovement>,
}

/// Normalize one raw result item into the canonical projection.
///
/// Fails only when no case number can be found under any alias, since without
/// the natural key the record cannot be reconciled. A sealed or partial
/// item still normalizes into a placeholder with `details_complete: false`.
pub fn normalize_result_item(item: &Value) -> Result<NormalizedProcess, CoreError> {
    let case_number = fields::first_str(item, CASE_NUMBER_KEYS)
        .ok_or_else(|| {
            CoreError::Validation("result item carries no case number under any known alias".into())
        })?
        .to_string();

    let roles = infer_parties(item);
    let movements = extract_movements(item);

    // A record with neither party data nor movements is a bare cover,
    // typical of sealed cases.
    let details_complete = !movements.is_empty() || !roles.active.is_empty();

    Ok(NormalizedProcess {
        case_number,
        active_party: roles.active,
        passive_party: roles.passive,
        court_name: fields::first_str(item, COURT_NAME_KEYS).map(str::to_string),
        court_acronym: fields::first_str(item, COURT_ACRONYM_KEYS).map(str::to_string),
        phase: fields::first_str(item, PHASE_KEYS).map(str::to_string),
        status: fields::first_str(item, STATUS_KEYS).map(str::to_string),
        filing_value: fields::first_f64(item, FILING_VALUE_KEYS),
        raw: item.clone(),
        details_complete,
        movements,
    })
}

/// Normalize a whole collected batch, skipping items without a usable
/// natural key. Returns the projections plus the number of skipped items.
pub fn normalize_batch(items: &[Value]) -> (Vec<NormalizedProcess>, usize) {
    let mut processes = Vec::with_capacity(items.len());
    let mut skipped = 0;

    for item in items {
        match normalize_result_item(item) {
            Ok(process) => processes.push(process),
            Err(_) => skipped += 1,
        }
    }

    (processes, skipped)
}
