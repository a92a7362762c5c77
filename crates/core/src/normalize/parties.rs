//! Plaintiff/defendant inference over inconsistently-shaped party data.
//!
//! Upstream completeness degrades with case age and court level: recent
//! first-instance cases carry a full party list with explicit roles, while
//! appellate and historical cases may carry only a free-text case name.
//! Inference therefore runs a strict ordered fallback chain and stops at
//! the first rule producing a non-empty active/passive pair, so that both
//! sides are never left blank when any textual signal exists.

use serde_json::Value;

use super::fields::{first_i64, first_str};

/// Keys under which the provider may nest the party list.
const PARTY_CONTAINER_KEYS: &[&str] = &["parties", "partes", "envolvidos"];

/// Keys under which a party's display name may appear.
const PARTY_NAME_KEYS: &[&str] = &["name", "nome"];

/// Keys carrying a party's explicit side/role/type marker.
const PARTY_SIDE_KEYS: &[&str] = &["side", "role", "type", "polo", "tipo"];

/// Keys carrying the case's free-text name ("Autor X Réu").
const CASE_NAME_KEYS: &[&str] = &["name", "nome", "title", "titulo"];

/// Keys carrying the instance/level of the proceeding.
const INSTANCE_KEYS: &[&str] = &["instance", "instancia", "degree", "grau"];

/// Role vocabulary marking a party as plaintiff-like. Matched
/// case-insensitively against the side marker.
const ACTIVE_ROLES: &[&str] = &[
    "active",
    "ativo",
    "polo ativo",
    "autor",
    "autora",
    "requerente",
    "exequente",
    "reclamante",
    "demandante",
    "impetrante",
    "embargante",
    "agravante",
    "apelante",
    "recorrente",
];

/// Role vocabulary marking a party as defendant-like.
const PASSIVE_ROLES: &[&str] = &[
    "passive",
    "passivo",
    "polo passivo",
    "reu",
    "réu",
    "re",
    "ré",
    "requerido",
    "requerida",
    "executado",
    "executada",
    "reclamado",
    "reclamada",
    "demandado",
    "demandada",
    "impetrado",
    "embargado",
    "agravado",
    "apelado",
    "recorrido",
];

/// Role vocabulary marking a third/interested party.
const THIRD_PARTY_ROLES: &[&str] = &[
    "terceiro",
    "terceiro interessado",
    "interessado",
    "interessada",
    "third",
    "third party",
    "interested",
];

/// Tokens meaning "versus" inside a free-text case name.
const VERSUS_TOKENS: &[&str] = &[" x ", " vs ", " vs. ", " versus "];

/// Sentinel used for the passive side when only interested parties are
/// listed (typically an appellate proceeding).
pub const INTERESTED_PARTY_SENTINEL: &str = "Parte interessada (processo em grau de recurso)";

/// Sentinel used for the passive side of a second-or-higher-instance
/// record whose party data was not captured.
pub const SECOND_INSTANCE_SENTINEL: &str = "Processo em segunda instância";

/// Inferred active/passive party names for one legal process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyRoles {
    pub active: String,
    pub passive: String,
}

/// Run the fallback chain over one raw result item.
///
/// Rules, in order, stopping at the first that yields a non-empty pair:
///
/// 1. Explicit side markers on a party list.
/// 2. Third parties only: joined third-party names vs. the
///    interested-party sentinel.
/// 3. A "versus" separator inside the free-text case name.
/// 4. Instance >= 2: whole case name vs. the second-instance sentinel.
/// 5. Whole case name as the active side, passive empty.
pub fn infer_parties(item: &Value) -> PartyRoles {
    if let Some(roles) = from_side_markers(item) {
        return roles;
    }
    if let Some(roles) = from_third_parties(item) {
        return roles;
    }

    let case_name = first_str(item, CASE_NAME_KEYS).unwrap_or_default();

    if let Some(roles) = from_versus_split(case_name) {
        return roles;
    }

    let instance = first_i64(item, INSTANCE_KEYS).unwrap_or(1);
    if instance >= 2 && !case_name.is_empty() {
        return PartyRoles {
            active: case_name.to_string(),
            passive: SECOND_INSTANCE_SENTINEL.to_string(),
        };
    }

    PartyRoles {
        active: case_name.to_string(),
        passive: String::new(),
    }
}

/// Rule 1: classify listed parties by their explicit side marker.
fn from_side_markers(item: &Value) -> Option<PartyRoles> {
    let parties = party_list(item)?;

    let mut active: Vec<&str> = Vec::new();
    let mut passive: Vec<&str> = Vec::new();

    for party in parties {
        let Some(name) = first_str(party, PARTY_NAME_KEYS) else {
            continue;
        };
        let Some(side) = first_str(party, PARTY_SIDE_KEYS) else {
            continue;
        };
        let side = side.to_lowercase();

        if matches_role(&side, ACTIVE_ROLES) {
            active.push(name);
        } else if matches_role(&side, PASSIVE_ROLES) {
            passive.push(name);
        }
    }

    if active.is_empty() && passive.is_empty() {
        return None;
    }

    Some(PartyRoles {
        active: active.join(" e "),
        passive: passive.join(" e "),
    })
}

/// Rule 2: only third/interested parties are listed.
fn from_third_parties(item: &Value) -> Option<PartyRoles> {
    let parties = party_list(item)?;

    let third: Vec<&str> = parties
        .iter()
        .filter_map(|party| {
            let name = first_str(party, PARTY_NAME_KEYS)?;
            let side = first_str(party, PARTY_SIDE_KEYS)?.to_lowercase();
            matches_role(&side, THIRD_PARTY_ROLES).then_some(name)
        })
        .collect();

    if third.is_empty() {
        return None;
    }

    Some(PartyRoles {
        active: third.join(" e "),
        passive: INTERESTED_PARTY_SENTINEL.to_string(),
    })
}

/// Rule 3: split the free-text case name on a "versus" token.
///
/// Matching is ASCII-case-insensitive over the original string. Lowercasing
/// the whole name first would shift byte offsets for characters whose
/// lowercase form has a different byte length (e.g. U+0130), so offsets are
/// found directly in the original.
fn from_versus_split(case_name: &str) -> Option<PartyRoles> {
    for token in VERSUS_TOKENS {
        if let Some(pos) = find_ascii_ignore_case(case_name, token) {
            let active = case_name[..pos].trim();
            let passive = case_name[pos + token.len()..].trim();
            if !active.is_empty() && !passive.is_empty() {
                return Some(PartyRoles {
                    active: active.to_string(),
                    passive: passive.to_string(),
                });
            }
        }
    }
    None
}

/// Byte offset of the first ASCII-case-insensitive occurrence of `needle`
/// in `haystack`. The tokens searched for are ASCII, so every match starts
/// and ends on a char boundary of the original string.
fn find_ascii_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

fn party_list(item: &Value) -> Option<&Vec<Value>> {
    PARTY_CONTAINER_KEYS
        .iter()
        .filter_map(|key| item.get(key).and_then(Value::as_array))
        .find(|arr| !arr.is_empty())
}

fn matches_role(side: &str, vocabulary: &[&str]) -> bool {
    vocabulary.iter().any(|role| side == *role)
}
