//! Per-invocation capture of outbound provider calls.
//!
//! The provider crate is persistence-free: instead of writing audit rows
//! directly, every round trip pushes a [`CallRecord`] into the
//! invocation's [`CallRecorder`]. The orchestration layer flushes the
//! recorder to the `api_call_logs` table with tenant/user attribution
//! attached, regardless of whether the operation succeeded.

use serde_json::Value;

/// Category of an outbound provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Submit,
    Poll,
    TrackingState,
    TrackingCreate,
    TrackingDelete,
    WebhookIngest,
}

impl CallKind {
    /// Storage value for the `call_kind` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Poll => "poll",
            Self::TrackingState => "tracking_state",
            Self::TrackingCreate => "tracking_create",
            Self::TrackingDelete => "tracking_delete",
            Self::WebhookIngest => "webhook_ingest",
        }
    }

    /// Fixed per-call cost estimate, in the provider's billing currency.
    /// Logged for audit only; no cost accounting happens here.
    pub fn cost_estimate(self) -> f64 {
        match self {
            Self::Submit => 0.25,
            Self::TrackingCreate => 0.10,
            Self::Poll | Self::TrackingState | Self::TrackingDelete | Self::WebhookIngest => 0.0,
        }
    }
}

/// One captured provider round trip.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub kind: CallKind,
    pub endpoint: String,
    pub request_payload: Option<Value>,
    pub job_id: Option<String>,
    pub success: bool,
    pub http_status: Option<u16>,
    pub error_text: Option<String>,
    pub cost_estimate: f64,
}

/// Accumulates [`CallRecord`]s over one sync invocation.
#[derive(Debug, Default)]
pub struct CallRecorder {
    records: Vec<CallRecord>,
}

impl CallRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful call.
    pub fn success(
        &mut self,
        kind: CallKind,
        endpoint: impl Into<String>,
        payload: Option<Value>,
        job_id: Option<String>,
    ) {
        self.records.push(CallRecord {
            kind,
            endpoint: endpoint.into(),
            request_payload: payload,
            job_id,
            success: true,
            http_status: None,
            error_text: None,
            cost_estimate: kind.cost_estimate(),
        });
    }

    /// Record a failed call.
    pub fn failure(
        &mut self,
        kind: CallKind,
        endpoint: impl Into<String>,
        payload: Option<Value>,
        http_status: Option<u16>,
        error: impl Into<String>,
    ) {
        self.records.push(CallRecord {
            kind,
            endpoint: endpoint.into(),
            request_payload: payload,
            job_id: None,
            success: false,
            http_status,
            error_text: Some(error.into()),
            cost_estimate: kind.cost_estimate(),
        });
    }

    /// All captured records, in call order.
    pub fn records(&self) -> &[CallRecord] {
        &self.records
    }

    /// Drain the captured records for flushing to storage.
    pub fn take(&mut self) -> Vec<CallRecord> {
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_kept_in_call_order() {
        let mut recorder = CallRecorder::new();
        recorder.success(CallKind::Submit, "/requests", None, Some("job-1".into()));
        recorder.failure(CallKind::Poll, "/requests/job-1", None, Some(500), "boom");

        let records = recorder.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].success);
        assert_eq!(records[0].cost_estimate, CallKind::Submit.cost_estimate());
        assert_eq!(records[1].http_status, Some(500));
    }

    #[test]
    fn take_drains_the_recorder() {
        let mut recorder = CallRecorder::new();
        recorder.success(CallKind::TrackingState, "/tracking/t-1", None, None);
        assert_eq!(recorder.take().len(), 1);
        assert!(recorder.records().is_empty());
    }
}
