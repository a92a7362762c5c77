//! Provider client configuration.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ProviderError;

/// Expected API key format (UUID). Malformed keys fail fast with a
/// configuration error instead of burning an upstream call.
const API_KEY_PATTERN: &str =
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

fn api_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(API_KEY_PATTERN).expect("API key pattern must compile"))
}

/// Validate that an API key matches the provider's identifier format.
pub fn validate_api_key(key: &str) -> Result<(), ProviderError> {
    if api_key_regex().is_match(key.trim()) {
        Ok(())
    } else {
        Err(ProviderError::Configuration(
            "API key does not match the expected identifier format".into(),
        ))
    }
}

/// Connection settings for the legal-data provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base HTTP URL, without a trailing slash.
    pub base_url: String,
    /// Shared API key, sent in the `api-key` request header.
    pub api_key: String,
}

impl ProviderConfig {
    /// Build a validated configuration.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        validate_api_key(&api_key)?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { base_url, api_key })
    }

    /// Load configuration from environment variables.
    ///
    /// | Env Var             | Required |
    /// |---------------------|----------|
    /// | `PROVIDER_BASE_URL` | yes      |
    /// | `PROVIDER_API_KEY`  | yes      |
    pub fn from_env() -> Result<Self, ProviderError> {
        let base_url = std::env::var("PROVIDER_BASE_URL")
            .map_err(|_| ProviderError::Configuration("PROVIDER_BASE_URL must be set".into()))?;
        let api_key = std::env::var("PROVIDER_API_KEY")
            .map_err(|_| ProviderError::Configuration("PROVIDER_API_KEY must be set".into()))?;
        Self::new(base_url, api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_key_is_accepted() {
        assert!(validate_api_key("123e4567-e89b-42d3-a456-426614174000").is_ok());
    }

    #[test]
    fn malformed_key_fails_fast() {
        assert!(validate_api_key("not-a-key").is_err());
        assert!(validate_api_key("").is_err());
    }

    #[test]
    fn trailing_slash_is_stripped_from_base_url() {
        let cfg = ProviderConfig::new(
            "https://api.example.com/",
            "123e4567-e89b-42d3-a456-426614174000",
        )
        .unwrap();
        assert_eq!(cfg.base_url, "https://api.example.com");
    }
}
