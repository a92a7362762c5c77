//! Request Submitter: search submission with payload-variant retry.
//!
//! The provider intermittently rejects well-formed submissions depending
//! on which optional flags are present. On a transient failure the
//! submitter walks a fixed ordered sequence of alternative payload shapes
//! with a fixed delay between attempts; an authorization failure aborts
//! immediately. Variant exhaustion is reported as a structured outcome
//! (carrying the last status and the attempted variant labels), not as an
//! error; a manual retry later commonly succeeds, so callers surface it
//! as "temporarily unavailable".

use std::time::Duration;

use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::log::{CallKind, CallRecorder};
use crate::search::SearchType;
use crate::transport::ProviderTransport;

/// Delay between variant attempts.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Keys under which the provider returns the job id.
const JOB_ID_KEYS: &[&str] = &["request_id", "id"];

/// One alternative request-body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadVariant {
    /// Stable label, used in audit records and exhaustion reports.
    pub label: &'static str,
    /// Request on-demand execution.
    pub on_demand: Option<bool>,
    /// Request a masked (redacted) response.
    pub masked_response: Option<bool>,
    /// Use the alternate top-level shape `{ "search": { ... } }` instead
    /// of the flat body.
    pub nested: bool,
}

impl PayloadVariant {
    /// Build the request body for this variant.
    pub fn build_body(&self, search_type: SearchType, search_key: &str) -> Value {
        if self.nested {
            let mut search = json!({
                "search_type": search_type.as_str(),
                "search_key": search_key,
            });
            if let Some(on_demand) = self.on_demand {
                search["on_demand"] = json!(on_demand);
            }
            json!({ "search": search })
        } else {
            let mut params = serde_json::Map::new();
            if let Some(on_demand) = self.on_demand {
                params.insert("on_demand".into(), json!(on_demand));
            }
            if let Some(masked) = self.masked_response {
                params.insert("masked_response".into(), json!(masked));
            }
            json!({
                "search_type": search_type.as_str(),
                "search_key": search_key,
                "search_params": Value::Object(params),
            })
        }
    }
}

/// The fixed variant sequence observed to maximize acceptance, in order.
pub fn default_variants() -> Vec<PayloadVariant> {
    vec![
        PayloadVariant {
            label: "default",
            on_demand: None,
            masked_response: None,
            nested: false,
        },
        PayloadVariant {
            label: "on-demand",
            on_demand: Some(true),
            masked_response: None,
            nested: false,
        },
        PayloadVariant {
            label: "masked",
            on_demand: Some(true),
            masked_response: Some(true),
            nested: false,
        },
        PayloadVariant {
            label: "nested-on-demand",
            on_demand: Some(true),
            masked_response: None,
            nested: true,
        },
    ]
}

/// Submitter configuration. The variant sequence is explicit so tests can
/// inject shorter or different sequences.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub variants: Vec<PayloadVariant>,
    pub retry_delay: Duration,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            variants: default_variants(),
            retry_delay: RETRY_DELAY,
        }
    }
}

/// Result of a submission attempt sequence.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The provider accepted a variant and issued a job id.
    Submitted {
        job_id: String,
        variant: &'static str,
    },
    /// Every variant was rejected with a transient fault. Retryable by
    /// the caller; not a hard error.
    Exhausted {
        last_status: Option<u16>,
        attempted: Vec<&'static str>,
    },
}

/// Submit a search, walking the variant sequence on transient failures.
///
/// Returns `Err` only for authorization failures (bad credentials are a
/// configuration problem; further variants would fail identically).
pub async fn submit_search(
    transport: &dyn ProviderTransport,
    config: &SubmitConfig,
    search_type: SearchType,
    search_key: &str,
    recorder: &mut CallRecorder,
) -> Result<SubmitOutcome, ProviderError> {
    let mut attempted: Vec<&'static str> = Vec::new();
    let mut last_status: Option<u16> = None;

    for (index, variant) in config.variants.iter().enumerate() {
        let body = variant.build_body(search_type, search_key);
        attempted.push(variant.label);

        match transport.submit_request(&body).await {
            Ok(response) => {
                if let Some(job_id) = extract_job_id(&response) {
                    recorder.success(
                        CallKind::Submit,
                        "/requests",
                        Some(body),
                        Some(job_id.clone()),
                    );
                    tracing::info!(
                        job_id = %job_id,
                        variant = variant.label,
                        search_type = search_type.as_str(),
                        "Search submitted",
                    );
                    return Ok(SubmitOutcome::Submitted {
                        job_id,
                        variant: variant.label,
                    });
                }
                // Accepted but no job id: treat like a transient rejection.
                recorder.failure(
                    CallKind::Submit,
                    "/requests",
                    Some(body),
                    None,
                    "response carried no job id",
                );
            }
            Err(e) if e.is_auth_failure() => {
                recorder.failure(
                    CallKind::Submit,
                    "/requests",
                    Some(body),
                    e.upstream_status(),
                    e.to_string(),
                );
                tracing::error!(error = %e, "Submission aborted: credentials rejected");
                return Err(ProviderError::Configuration(format!(
                    "provider rejected credentials: {e}"
                )));
            }
            Err(e) => {
                last_status = e.upstream_status();
                recorder.failure(
                    CallKind::Submit,
                    "/requests",
                    Some(body),
                    last_status,
                    e.to_string(),
                );
                tracing::warn!(
                    variant = variant.label,
                    error = %e,
                    "Submission variant rejected, trying next",
                );
            }
        }

        if index + 1 < config.variants.len() {
            tokio::time::sleep(config.retry_delay).await;
        }
    }

    tracing::warn!(
        attempted = ?attempted,
        last_status = ?last_status,
        "All submission variants exhausted",
    );
    Ok(SubmitOutcome::Exhausted {
        last_status,
        attempted,
    })
}

/// Extract the provider-issued job id from a submission response.
fn extract_job_id(response: &Value) -> Option<String> {
    JOB_ID_KEYS.iter().find_map(|key| {
        response
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_body_carries_search_params() {
        let variant = &default_variants()[2];
        let body = variant.build_body(SearchType::Cnpj, "12345678000199");
        assert_eq!(body["search_type"], "cnpj");
        assert_eq!(body["search_params"]["on_demand"], true);
        assert_eq!(body["search_params"]["masked_response"], true);
    }

    #[test]
    fn nested_body_uses_alternate_top_level_shape() {
        let variant = &default_variants()[3];
        let body = variant.build_body(SearchType::Oab, "PR12345");
        assert_eq!(body["search"]["search_type"], "oab");
        assert_eq!(body["search"]["on_demand"], true);
        assert!(body.get("search_params").is_none());
    }

    #[test]
    fn job_id_aliases_are_checked_in_order() {
        let with_request_id = serde_json::json!({ "request_id": "a", "id": "b" });
        assert_eq!(extract_job_id(&with_request_id).as_deref(), Some("a"));

        let with_id_only = serde_json::json!({ "id": "b" });
        assert_eq!(extract_job_id(&with_id_only).as_deref(), Some("b"));

        assert_eq!(extract_job_id(&serde_json::json!({})), None);
    }

    #[test]
    fn default_sequence_has_four_variants() {
        let labels: Vec<_> = default_variants().iter().map(|v| v.label).collect();
        assert_eq!(
            labels,
            ["default", "on-demand", "masked", "nested-on-demand"]
        );
    }
}
