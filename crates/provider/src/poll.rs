//! Poll Collector: bounded polling of an asynchronous provider job.
//!
//! Two query styles exist upstream and both are supported by one
//! collector: a job-status endpoint that carries the result object once
//! `completed` ([`PollMode::Status`]), and a paginated results endpoint
//! walked page-by-page ([`PollMode::Paginated`]). The attempt budget is
//! the only cancellation mechanism: polling is strictly sequential and
//! returns [`PollOutcome::TimedOut`] rather than blocking past its budget.
//!
//! A `completed` job with zero results is a valid outcome (sealed or
//! restricted case) and is reported as `Completed(vec![])`, never as a
//! timeout.

use std::time::Duration;

use serde_json::Value;

use crate::error::ProviderError;
use crate::log::{CallKind, CallRecorder};
use crate::transport::ProviderTransport;

/// Upper bound on the paginated walk.
pub const MAX_PAGES: u32 = 50;

/// Delay between page fetches, to avoid overwhelming the provider.
const PAGE_DELAY: Duration = Duration::from_millis(400);

/// Page size requested from the paginated endpoint.
const PAGE_SIZE: u32 = 100;

/// Status values meaning "still running".
const PENDING_STATUSES: &[&str] = &["submitted", "pending", "processing", "started"];

/// Which upstream query style to use for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollMode {
    /// Job-status endpoint; result object arrives inline once completed.
    Status,
    /// Paginated results endpoint, walked page-by-page after completion.
    Paginated,
}

/// Attempt/interval budget for one polling call.
///
/// This is the cooperative cancellation mechanism: there is no external
/// abort, only the bounded attempt count.
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    /// Maximum number of status checks.
    pub attempts: u32,
    /// Delay between status checks.
    pub interval: Duration,
    /// Optional initial grace period before the first check.
    pub grace: Option<Duration>,
}

impl PollBudget {
    /// Budget for single-result jobs: 30 attempts at 2 s.
    pub fn single_result() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(2),
            grace: None,
        }
    }

    /// Budget for cover/detail jobs: 45 attempts at 2 s after a 3 s
    /// grace period (detail jobs reliably need a few seconds to start
    /// producing data).
    pub fn detail() -> Self {
        Self {
            attempts: 45,
            interval: Duration::from_secs(2),
            grace: Some(Duration::from_secs(3)),
        }
    }
}

/// Terminal result of one polling call.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The job completed. The batch may be empty (sealed case).
    Completed(Vec<Value>),
    /// The attempt budget elapsed with the job still running.
    TimedOut { attempts: u32 },
    /// The job reached a terminal error state upstream.
    Failed { message: String },
}

/// Poll a job until terminal state or budget exhaustion, assembling the
/// complete result set.
pub async fn collect(
    transport: &dyn ProviderTransport,
    job_id: &str,
    mode: PollMode,
    budget: PollBudget,
    recorder: &mut CallRecorder,
) -> Result<PollOutcome, ProviderError> {
    if let Some(grace) = budget.grace {
        tokio::time::sleep(grace).await;
    }

    let endpoint = format!("/requests/{job_id}");

    for attempt in 1..=budget.attempts {
        let status = match transport.request_status(job_id).await {
            Ok(response) => response,
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => {
                recorder.failure(
                    CallKind::Poll,
                    &endpoint,
                    None,
                    e.upstream_status(),
                    e.to_string(),
                );
                tracing::warn!(job_id, attempt, error = %e, "Poll attempt failed");
                tokio::time::sleep(budget.interval).await;
                continue;
            }
        };
        recorder.success(CallKind::Poll, &endpoint, None, Some(job_id.to_string()));

        match job_state(&status) {
            JobState::Completed => {
                let items = match mode {
                    PollMode::Status => inline_results(&status),
                    PollMode::Paginated => {
                        walk_pages(transport, job_id, recorder).await?
                    }
                };
                tracing::info!(job_id, items = items.len(), attempt, "Job completed");
                return Ok(PollOutcome::Completed(items));
            }
            JobState::Error(message) => {
                tracing::warn!(job_id, %message, "Job reached error state");
                return Ok(PollOutcome::Failed { message });
            }
            JobState::Pending => {
                if attempt < budget.attempts {
                    tokio::time::sleep(budget.interval).await;
                }
            }
        }
    }

    tracing::warn!(job_id, attempts = budget.attempts, "Poll budget exhausted");
    Ok(PollOutcome::TimedOut {
        attempts: budget.attempts,
    })
}

enum JobState {
    Completed,
    Error(String),
    Pending,
}

fn job_state(status: &Value) -> JobState {
    let label = status
        .get("status")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_lowercase();

    if label == "completed" {
        JobState::Completed
    } else if label == "error" || label == "failed" {
        let message = status
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("job failed upstream")
            .to_string();
        JobState::Error(message)
    } else if PENDING_STATUSES.contains(&label.as_str()) || label.is_empty() {
        JobState::Pending
    } else {
        // Unknown status labels are treated as still-pending; the budget
        // bounds how long we tolerate them.
        JobState::Pending
    }
}

/// Results embedded in a completed status response.
fn inline_results(status: &Value) -> Vec<Value> {
    match status.get("response_data") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(_)) => vec![status["response_data"].clone()],
        _ => Vec::new(),
    }
}

/// Walk the paginated results endpoint until an empty page, the reported
/// `total_pages`, or the hard page bound.
async fn walk_pages(
    transport: &dyn ProviderTransport,
    job_id: &str,
    recorder: &mut CallRecorder,
) -> Result<Vec<Value>, ProviderError> {
    let mut items: Vec<Value> = Vec::new();
    let mut page: u32 = 1;
    let mut total_pages: Option<u32> = None;

    loop {
        let endpoint = format!("/responses?request_id={job_id}&page={page}");
        let response = match transport.response_page(job_id, page, PAGE_SIZE).await {
            Ok(response) => response,
            Err(e) if e.is_auth_failure() => return Err(e),
            Err(e) => {
                recorder.failure(
                    CallKind::Poll,
                    &endpoint,
                    None,
                    e.upstream_status(),
                    e.to_string(),
                );
                // A broken page ends the walk; what was assembled so far
                // still gets processed.
                tracing::warn!(job_id, page, error = %e, "Page fetch failed, ending walk");
                break;
            }
        };
        recorder.success(CallKind::Poll, &endpoint, None, Some(job_id.to_string()));

        let page_data = response
            .get("page_data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        if total_pages.is_none() {
            total_pages = response
                .get("total_pages")
                .and_then(Value::as_u64)
                .map(|n| n as u32);
        }

        if page_data.is_empty() {
            break;
        }
        items.extend(page_data);

        page += 1;
        if page > MAX_PAGES {
            tracing::warn!(job_id, "Page bound reached, ending walk");
            break;
        }
        if let Some(total) = total_pages {
            if page > total {
                break;
            }
        }

        tokio::time::sleep(PAGE_DELAY).await;
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completed_status_with_object_yields_single_item() {
        let status = json!({ "status": "completed", "response_data": { "code": "1" } });
        assert!(matches!(job_state(&status), JobState::Completed));
        assert_eq!(inline_results(&status).len(), 1);
    }

    #[test]
    fn completed_status_without_data_yields_empty_batch() {
        let status = json!({ "status": "completed" });
        assert!(inline_results(&status).is_empty());
    }

    #[test]
    fn unknown_status_counts_as_pending() {
        assert!(matches!(
            job_state(&json!({ "status": "queued_weirdly" })),
            JobState::Pending
        ));
    }

    #[test]
    fn error_status_carries_upstream_message() {
        let state = job_state(&json!({ "status": "error", "error": "sealed" }));
        match state {
            JobState::Error(message) => assert_eq!(message, "sealed"),
            _ => panic!("expected error state"),
        }
    }
}
