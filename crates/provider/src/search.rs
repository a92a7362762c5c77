//! Search types supported by the provider.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// What kind of identity a search (or tracking subscription) targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Attorney registration number.
    Oab,
    /// Company tax id.
    Cnpj,
    /// A single case, by CNJ-formatted case number.
    LawsuitCnj,
}

impl SearchType {
    /// Wire value used in request bodies and stored in `entity_kind`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Oab => "oab",
            Self::Cnpj => "cnpj",
            Self::LawsuitCnj => "lawsuit_cnj",
        }
    }

    /// Parse a stored `entity_kind` value.
    pub fn parse(value: &str) -> Result<Self, ProviderError> {
        match value {
            "oab" => Ok(Self::Oab),
            "cnpj" => Ok(Self::Cnpj),
            "lawsuit_cnj" => Ok(Self::LawsuitCnj),
            other => Err(ProviderError::Configuration(format!(
                "unknown search type: {other}"
            ))),
        }
    }
}
