//! Ordered field-alias accessors over raw provider JSON.
//!
//! The provider names the same concept differently depending on the search
//! type and endpoint (e.g. a movement date may arrive as `step_date`,
//! `date`, or `data`). Every read of a raw payload therefore goes through
//! an ordered candidate list evaluated in priority order; single hard-coded
//! field names are not used anywhere in the normalizer.

use serde_json::Value;

/// First non-empty string among the candidate keys, in order.
pub fn first_str<'a>(item: &'a Value, candidates: &[&str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|key| item.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// First non-empty array among the candidate keys, in order.
pub fn first_array<'a>(item: &'a Value, candidates: &[&str]) -> Option<&'a Vec<Value>> {
    candidates
        .iter()
        .filter_map(|key| item.get(key).and_then(Value::as_array))
        .find(|arr| !arr.is_empty())
}

/// First numeric value among the candidate keys, in order.
///
/// Accepts JSON numbers and numeric strings (the provider serializes
/// filing values both ways).
pub fn first_f64(item: &Value, candidates: &[&str]) -> Option<f64> {
    candidates.iter().find_map(|key| {
        let v = item.get(key)?;
        v.as_f64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    })
}

/// First integer value among the candidate keys, in order.
pub fn first_i64(item: &Value, candidates: &[&str]) -> Option<i64> {
    candidates.iter().find_map(|key| {
        let v = item.get(key)?;
        v.as_i64()
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    })
}
