//! Integration tests for the submit/poll/resolve flows against a
//! scripted in-memory transport.
//!
//! Budgets and retry delays are injected with millisecond values so the
//! bounded-attempt behavior is exercised without real multi-second waits.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use serde_json::{json, Value};

use lexsync_provider::poll::{collect, PollBudget, PollMode, PollOutcome};
use lexsync_provider::submit::{default_variants, submit_search, SubmitConfig, SubmitOutcome};
use lexsync_provider::tracking::{resolve_subscription, sync_subscription, TrackingResolution};
use lexsync_provider::{CallRecorder, ProviderError, ProviderTransport, SearchType, TrackingPoll};

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

/// Behavior script for the stub transport.
#[derive(Default)]
struct Script {
    /// Response for `submit_request`; `None` means HTTP 500.
    submit_response: Option<Value>,
    /// Fail submissions with 401 instead of 500.
    submit_unauthorized: bool,
    /// Status returned until `completes_after_attempts` is reached.
    status_response: Value,
    /// After this many status checks, report `completed`.
    completes_after_attempts: Option<u32>,
    /// Inline result payload once completed.
    completed_response: Value,
    /// Pages served by the paginated endpoint (page 1 is index 0).
    pages: Vec<Vec<Value>>,
    /// Tracking-state response; `None` means HTTP 404.
    tracking_state: Option<Value>,
}

#[derive(Default)]
struct StubTransport {
    script: Script,
    submit_calls: AtomicU32,
    status_calls: AtomicU32,
    page_calls: AtomicU32,
}

impl StubTransport {
    fn new(script: Script) -> Self {
        Self {
            script,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ProviderTransport for StubTransport {
    async fn submit_request(&self, _body: &Value) -> Result<Value, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if self.script.submit_unauthorized {
            return Err(ProviderError::Upstream {
                status: 401,
                body: "unauthorized".into(),
            });
        }
        match &self.script.submit_response {
            Some(response) => Ok(response.clone()),
            None => Err(ProviderError::Upstream {
                status: 500,
                body: "internal error".into(),
            }),
        }
    }

    async fn request_status(&self, _job_id: &str) -> Result<Value, ProviderError> {
        let attempt = self.status_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(after) = self.script.completes_after_attempts {
            if attempt >= after {
                return Ok(self.script.completed_response.clone());
            }
        }
        Ok(self.script.status_response.clone())
    }

    async fn response_page(
        &self,
        _job_id: &str,
        page: u32,
        _page_size: u32,
    ) -> Result<Value, ProviderError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let page_data = self
            .script
            .pages
            .get((page - 1) as usize)
            .cloned()
            .unwrap_or_default();
        Ok(json!({
            "page_data": page_data,
            "total_pages": self.script.pages.len(),
        }))
    }

    async fn tracking_state(&self, _tracking_id: &str) -> Result<Value, ProviderError> {
        match &self.script.tracking_state {
            Some(state) => Ok(state.clone()),
            None => Err(ProviderError::Upstream {
                status: 404,
                body: "not found".into(),
            }),
        }
    }

    async fn create_tracking(&self, _body: &Value) -> Result<Value, ProviderError> {
        Ok(json!({ "tracking_id": "trk-1" }))
    }

    async fn delete_tracking(&self, _tracking_id: &str) -> Result<(), ProviderError> {
        Ok(())
    }
}

fn fast_submit_config() -> SubmitConfig {
    SubmitConfig {
        variants: default_variants(),
        retry_delay: Duration::from_millis(5),
    }
}

fn fast_budget(attempts: u32) -> PollBudget {
    PollBudget {
        attempts,
        interval: Duration::from_millis(5),
        grace: None,
    }
}

// ---------------------------------------------------------------------------
// Request Submitter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submitter_returns_job_id_and_winning_variant() {
    let transport = StubTransport::new(Script {
        submit_response: Some(json!({ "request_id": "job-42" })),
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let outcome = submit_search(
        &transport,
        &fast_submit_config(),
        SearchType::Oab,
        "PR12345",
        &mut recorder,
    )
    .await
    .unwrap();

    assert_matches!(
        outcome,
        SubmitOutcome::Submitted { ref job_id, variant: "default" } if job_id == "job-42"
    );
    assert_eq!(transport.submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.records().len(), 1);
    assert!(recorder.records()[0].success);
}

#[tokio::test]
async fn submitter_attempts_exactly_the_configured_variants_then_reports_exhaustion() {
    let transport = StubTransport::new(Script {
        submit_response: None, // every variant gets a 500
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let outcome = submit_search(
        &transport,
        &fast_submit_config(),
        SearchType::Cnpj,
        "12345678000199",
        &mut recorder,
    )
    .await
    .unwrap();

    match outcome {
        SubmitOutcome::Exhausted {
            last_status,
            attempted,
        } => {
            assert_eq!(last_status, Some(500));
            assert_eq!(
                attempted,
                vec!["default", "on-demand", "masked", "nested-on-demand"]
            );
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    // Exactly four attempts; never a fifth.
    assert_eq!(transport.submit_calls.load(Ordering::SeqCst), 4);
    // Every failed attempt is audit-logged.
    assert_eq!(recorder.records().len(), 4);
    assert!(recorder.records().iter().all(|r| !r.success));
}

#[tokio::test]
async fn submitter_aborts_immediately_on_authorization_failure() {
    let transport = StubTransport::new(Script {
        submit_unauthorized: true,
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let result = submit_search(
        &transport,
        &fast_submit_config(),
        SearchType::Oab,
        "PR12345",
        &mut recorder,
    )
    .await;

    assert_matches!(result, Err(ProviderError::Configuration(_)));
    // No variant retries after a credentials rejection.
    assert_eq!(transport.submit_calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Poll Collector
// ---------------------------------------------------------------------------

#[tokio::test]
async fn paginated_walk_assembles_all_pages_in_order() {
    let pages: Vec<Vec<Value>> = (0..3)
        .map(|page| {
            (0..100)
                .map(|i| json!({ "code": format!("case-{}", page * 100 + i) }))
                .collect()
        })
        .collect();

    let transport = StubTransport::new(Script {
        completes_after_attempts: Some(1),
        completed_response: json!({ "status": "completed" }),
        pages,
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let outcome = collect(
        &transport,
        "job-7",
        PollMode::Paginated,
        fast_budget(5),
        &mut recorder,
    )
    .await
    .unwrap();

    let items = match outcome {
        PollOutcome::Completed(items) => items,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(items.len(), 300);
    assert_eq!(items[0]["code"], "case-0");
    assert_eq!(items[299]["code"], "case-299");
}

#[tokio::test]
async fn empty_completion_is_success_not_timeout() {
    let transport = StubTransport::new(Script {
        completes_after_attempts: Some(1),
        completed_response: json!({ "status": "completed" }),
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let outcome = collect(
        &transport,
        "sealed-job",
        PollMode::Status,
        fast_budget(3),
        &mut recorder,
    )
    .await
    .unwrap();

    // Outcome KIND matters: an empty batch is Completed, never TimedOut.
    assert_matches!(outcome, PollOutcome::Completed(ref items) if items.is_empty());
}

#[tokio::test]
async fn budget_exhaustion_reports_timeout_distinctly() {
    let transport = StubTransport::new(Script {
        status_response: json!({ "status": "submitted" }),
        completes_after_attempts: None,
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let outcome = collect(
        &transport,
        "slow-job",
        PollMode::Status,
        fast_budget(3),
        &mut recorder,
    )
    .await
    .unwrap();

    assert_matches!(outcome, PollOutcome::TimedOut { attempts: 3 });
    assert_eq!(transport.status_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn upstream_job_error_is_reported_as_failed() {
    let transport = StubTransport::new(Script {
        completes_after_attempts: Some(1),
        completed_response: json!({ "status": "error", "error": "case restricted" }),
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let outcome = collect(
        &transport,
        "bad-job",
        PollMode::Status,
        fast_budget(3),
        &mut recorder,
    )
    .await
    .unwrap();

    assert_matches!(outcome, PollOutcome::Failed { ref message } if message == "case restricted");
}

// ---------------------------------------------------------------------------
// Tracking Resolver
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lost_subscription_is_a_distinct_outcome() {
    let transport = StubTransport::new(Script {
        tracking_state: None, // 404 upstream
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let resolution = resolve_subscription(&transport, "trk-dead", &mut recorder)
        .await
        .unwrap();

    assert_eq!(resolution, TrackingResolution::SubscriptionLost);
}

#[tokio::test]
async fn subscription_without_job_reports_no_result_yet() {
    let transport = StubTransport::new(Script {
        tracking_state: Some(json!({ "status": "created" })),
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let resolution = resolve_subscription(&transport, "trk-new", &mut recorder)
        .await
        .unwrap();

    assert_eq!(resolution, TrackingResolution::NoResultYet);
}

#[tokio::test]
async fn tracking_sync_resolves_job_and_collects_results() {
    let transport = StubTransport::new(Script {
        tracking_state: Some(json!({ "last_request_id": "job-99" })),
        completes_after_attempts: Some(1),
        completed_response: json!({
            "status": "completed",
            "response_data": [ { "code": "0001" } ],
        }),
        ..Default::default()
    });
    let mut recorder = CallRecorder::new();

    let poll = sync_subscription(
        &transport,
        "trk-live",
        PollMode::Status,
        fast_budget(3),
        &mut recorder,
    )
    .await
    .unwrap();

    match poll {
        TrackingPoll::Result { job_id, outcome } => {
            assert_eq!(job_id, "job-99");
            assert_matches!(outcome, PollOutcome::Completed(ref items) if items.len() == 1);
        }
        other => panic!("expected a resolved result, got {other:?}"),
    }
}
