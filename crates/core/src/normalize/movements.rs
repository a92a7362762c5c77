//! Timeline (movement) extraction from raw process payloads.
//!
//! The provider scatters the movement list across several container field
//! names and orders it latest-first on some endpoints and oldest-first on
//! others. Extraction walks an ordered container alias list, reads each
//! entry through per-field alias lists, and normalizes the result to
//! chronological ascending order. Each movement also gets a content hash
//! used as the persistence dedup key, so re-polling the same job never
//! duplicates timeline rows.

use chrono::NaiveDate;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::fields::{first_array, first_str};

/// Container field names that may hold the movement list, checked in order.
pub const MOVEMENT_CONTAINER_KEYS: &[&str] =
    &["steps", "movements", "andamentos", "history", "last_steps"];

/// Aliases for a movement's date.
const DATE_KEYS: &[&str] = &["step_date", "date", "data", "movement_date"];

/// Aliases for a movement's description text.
const DESCRIPTION_KEYS: &[&str] = &["content", "description", "descricao", "texto", "text"];

/// Aliases for a movement's type/category label.
const TYPE_KEYS: &[&str] = &["step_type", "type", "tipo", "movement_type"];

/// Date formats observed across provider endpoints, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y-%m-%dT%H:%M:%S"];

/// One normalized timeline entry, ready for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMovement {
    pub movement_date: NaiveDate,
    pub movement_type: Option<String>,
    pub description: String,
    /// Raw step payload, kept verbatim for audit.
    pub raw: Value,
    /// SHA-256 over `date|description`; persistence dedup key.
    pub dedup_hash: String,
}

/// Extract and normalize all movements from one raw result item.
///
/// Returns movements in chronological ascending order. Entries without a
/// parseable date or any description text are dropped (they carry no
/// usable timeline signal).
pub fn extract_movements(item: &Value) -> Vec<NormalizedMovement> {
    let Some(raw_steps) = first_array(item, MOVEMENT_CONTAINER_KEYS) else {
        return Vec::new();
    };

    let mut movements: Vec<NormalizedMovement> = raw_steps
        .iter()
        .filter_map(normalize_step)
        .collect();

    // Some endpoints deliver latest-first; storage order is ascending.
    if is_descending(&movements) {
        movements.reverse();
    }

    movements
}

fn normalize_step(step: &Value) -> Option<NormalizedMovement> {
    let date_text = first_str(step, DATE_KEYS)?;
    let movement_date = parse_date(date_text)?;
    let description = first_str(step, DESCRIPTION_KEYS)?.to_string();
    let movement_type = first_str(step, TYPE_KEYS).map(str::to_string);

    let dedup_hash = movement_dedup_hash(movement_date, &description);

    Some(NormalizedMovement {
        movement_date,
        movement_type,
        description,
        raw: step.clone(),
        dedup_hash,
    })
}

/// Dedup key for one movement: hex SHA-256 over `date|description`.
pub fn movement_dedup_hash(date: NaiveDate, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(description.as_bytes());
    hex_encode(&hasher.finalize())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // RFC 3339 timestamps first, then the plain formats.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(text, fmt)
            .ok()
            .or_else(|| chrono::NaiveDateTime::parse_from_str(text, fmt).map(|dt| dt.date()).ok())
    })
}

fn is_descending(movements: &[NormalizedMovement]) -> bool {
    match (movements.first(), movements.last()) {
        (Some(first), Some(last)) => first.movement_date > last.movement_date,
        _ => false,
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn container_aliases_are_checked_in_order() {
        let item = json!({
            "andamentos": [
                { "data": "2025-01-10", "texto": "Despacho" },
            ],
        });
        let movements = extract_movements(&item);
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].description, "Despacho");
    }

    #[test]
    fn latest_first_input_is_reversed_to_ascending() {
        let item = json!({
            "steps": [
                { "step_date": "2025-03-01", "content": "Sentença" },
                { "step_date": "2025-02-01", "content": "Audiência" },
                { "step_date": "2025-01-01", "content": "Citação" },
            ],
        });
        let movements = extract_movements(&item);
        let dates: Vec<String> = movements
            .iter()
            .map(|m| m.movement_date.to_string())
            .collect();
        assert_eq!(dates, ["2025-01-01", "2025-02-01", "2025-03-01"]);
    }

    #[test]
    fn ascending_input_is_kept_as_is() {
        let item = json!({
            "steps": [
                { "step_date": "2025-01-01", "content": "Citação" },
                { "step_date": "2025-02-01", "content": "Audiência" },
            ],
        });
        let movements = extract_movements(&item);
        assert_eq!(movements[0].description, "Citação");
    }

    #[test]
    fn brazilian_date_format_is_accepted() {
        let item = json!({
            "movements": [
                { "date": "10/01/2025", "description": "Despacho" },
            ],
        });
        let movements = extract_movements(&item);
        assert_eq!(movements[0].movement_date.to_string(), "2025-01-10");
    }

    #[test]
    fn undated_or_empty_steps_are_dropped() {
        let item = json!({
            "steps": [
                { "content": "sem data" },
                { "step_date": "2025-01-10" },
                { "step_date": "2025-01-10", "content": "Despacho" },
            ],
        });
        let movements = extract_movements(&item);
        assert_eq!(movements.len(), 1);
    }

    #[test]
    fn dedup_hash_is_stable_per_date_and_description() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let a = movement_dedup_hash(date, "Despacho");
        let b = movement_dedup_hash(date, "Despacho");
        let c = movement_dedup_hash(date, "Sentença");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn no_container_yields_empty_list() {
        assert!(extract_movements(&json!({ "name": "A" })).is_empty());
    }
}
