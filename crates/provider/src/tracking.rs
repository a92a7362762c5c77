//! Tracking Resolver: recurring pulls through a standing subscription.
//!
//! A tracking subscription's state response names its most recent job id
//! in one of several shapes depending on the endpoint revision; the
//! extraction priority is `page_data[0].request_id`, then `request_id`,
//! then `last_request_id`. "No job id yet" and "subscription unknown
//! upstream" are distinct non-error outcomes so callers can respectively
//! treat them as "nothing new" and "prompt for re-activation".

use serde_json::{json, Value};

use crate::error::ProviderError;
use crate::log::{CallKind, CallRecorder};
use crate::poll::{collect, PollBudget, PollMode, PollOutcome};
use crate::search::SearchType;
use crate::transport::ProviderTransport;

/// Result of resolving a subscription's current job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingResolution {
    /// The subscription has produced a job.
    Resolved { job_id: String },
    /// The subscription exists but has not produced a result yet.
    NoResultYet,
    /// The subscription is unknown upstream (404). The caller must not
    /// keep retrying; the operator should re-activate monitoring.
    SubscriptionLost,
}

/// Result of a full tracking-driven pull.
#[derive(Debug)]
pub enum TrackingPoll {
    /// A job id was resolved and polled.
    Result {
        job_id: String,
        outcome: PollOutcome,
    },
    NoResultYet,
    SubscriptionLost,
}

/// Extract the most recent job id from a tracking-state response.
///
/// Checks, in priority order: `page_data[0].request_id`, `request_id`,
/// `last_request_id`.
pub fn extract_latest_job_id(state: &Value) -> Option<String> {
    let from_page = state
        .get("page_data")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|entry| entry.get("request_id"))
        .and_then(Value::as_str);

    from_page
        .or_else(|| state.get("request_id").and_then(Value::as_str))
        .or_else(|| state.get("last_request_id").and_then(Value::as_str))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Fetch a subscription's state and resolve its most recent job id.
pub async fn resolve_subscription(
    transport: &dyn ProviderTransport,
    tracking_id: &str,
    recorder: &mut CallRecorder,
) -> Result<TrackingResolution, ProviderError> {
    let endpoint = format!("/tracking/{tracking_id}");

    let state = match transport.tracking_state(tracking_id).await {
        Ok(state) => state,
        Err(ProviderError::Upstream { status: 404, body }) => {
            recorder.failure(
                CallKind::TrackingState,
                &endpoint,
                None,
                Some(404),
                format!("subscription not found upstream: {body}"),
            );
            tracing::warn!(tracking_id, "Tracking subscription lost upstream");
            return Ok(TrackingResolution::SubscriptionLost);
        }
        Err(e) => {
            recorder.failure(
                CallKind::TrackingState,
                &endpoint,
                None,
                e.upstream_status(),
                e.to_string(),
            );
            return Err(e);
        }
    };

    match extract_latest_job_id(&state) {
        Some(job_id) => {
            recorder.success(
                CallKind::TrackingState,
                &endpoint,
                None,
                Some(job_id.clone()),
            );
            Ok(TrackingResolution::Resolved { job_id })
        }
        None => {
            recorder.success(CallKind::TrackingState, &endpoint, None, None);
            tracing::debug!(tracking_id, "Subscription has not produced a result yet");
            Ok(TrackingResolution::NoResultYet)
        }
    }
}

/// Resolve a subscription and, if it has produced a job, collect that
/// job's results.
pub async fn sync_subscription(
    transport: &dyn ProviderTransport,
    tracking_id: &str,
    mode: PollMode,
    budget: PollBudget,
    recorder: &mut CallRecorder,
) -> Result<TrackingPoll, ProviderError> {
    match resolve_subscription(transport, tracking_id, recorder).await? {
        TrackingResolution::Resolved { job_id } => {
            let outcome = collect(transport, &job_id, mode, budget, recorder).await?;
            Ok(TrackingPoll::Result { job_id, outcome })
        }
        TrackingResolution::NoResultYet => Ok(TrackingPoll::NoResultYet),
        TrackingResolution::SubscriptionLost => Ok(TrackingPoll::SubscriptionLost),
    }
}

/// Create a standing monitor upstream. Returns the provider-assigned
/// tracking id.
pub async fn create_subscription(
    transport: &dyn ProviderTransport,
    search_type: SearchType,
    search_key: &str,
    recurrence_days: i32,
    recorder: &mut CallRecorder,
) -> Result<String, ProviderError> {
    let body = json!({
        "search_type": search_type.as_str(),
        "search_key": search_key,
        "recurrence": recurrence_days,
    });

    match transport.create_tracking(&body).await {
        Ok(response) => {
            let tracking_id = response
                .get("tracking_id")
                .or_else(|| response.get("id"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    ProviderError::Decode(<serde_json::Error as serde::de::Error>::custom(
                        "tracking creation response carried no id",
                    ))
                })?;
            recorder.success(
                CallKind::TrackingCreate,
                "/tracking",
                Some(body),
                Some(tracking_id.clone()),
            );
            tracing::info!(tracking_id = %tracking_id, "Tracking subscription created");
            Ok(tracking_id)
        }
        Err(e) => {
            recorder.failure(
                CallKind::TrackingCreate,
                "/tracking",
                Some(body),
                e.upstream_status(),
                e.to_string(),
            );
            Err(e)
        }
    }
}

/// Tear down a standing monitor upstream. A 404 is treated as already
/// deleted.
pub async fn delete_subscription(
    transport: &dyn ProviderTransport,
    tracking_id: &str,
    recorder: &mut CallRecorder,
) -> Result<(), ProviderError> {
    let endpoint = format!("/tracking/{tracking_id}");
    match transport.delete_tracking(tracking_id).await {
        Ok(()) | Err(ProviderError::Upstream { status: 404, .. }) => {
            recorder.success(CallKind::TrackingDelete, &endpoint, None, None);
            Ok(())
        }
        Err(e) => {
            recorder.failure(
                CallKind::TrackingDelete,
                &endpoint,
                None,
                e.upstream_status(),
                e.to_string(),
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_data_entry_wins_over_flat_fields() {
        let state = json!({
            "page_data": [ { "request_id": "from-page" } ],
            "request_id": "flat",
            "last_request_id": "last",
        });
        assert_eq!(extract_latest_job_id(&state).as_deref(), Some("from-page"));
    }

    #[test]
    fn flat_request_id_wins_over_last_request_id() {
        let state = json!({ "request_id": "flat", "last_request_id": "last" });
        assert_eq!(extract_latest_job_id(&state).as_deref(), Some("flat"));
    }

    #[test]
    fn last_request_id_is_the_final_fallback() {
        let state = json!({ "last_request_id": "last" });
        assert_eq!(extract_latest_job_id(&state).as_deref(), Some("last"));
    }

    #[test]
    fn empty_state_yields_none() {
        assert_eq!(extract_latest_job_id(&json!({})), None);
        assert_eq!(extract_latest_job_id(&json!({ "page_data": [] })), None);
        assert_eq!(extract_latest_job_id(&json!({ "request_id": "" })), None);
    }
}
