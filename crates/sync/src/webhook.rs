//! Push-path ingestion of provider webhook deliveries.
//!
//! The provider pushes a notification whenever a tracking subscription
//! produces a new job, and for completed one-off requests. Deliveries are
//! at-least-once and unordered, so ingestion is built around correlation
//! and duplicate suppression; the transport-facing handler acknowledges
//! every delivery regardless of what happens here, since a non-2xx reply
//! only triggers provider-side redelivery of the same payload.

use serde::Serialize;
use serde_json::Value;

use lexsync_core::normalize::fields::first_str;
use lexsync_core::types::TenantContext;
use lexsync_db::models::monitored_entity::MonitoredEntity;
use lexsync_db::repositories::{CallLogRepo, MonitoredEntityRepo};
use lexsync_provider::poll::collect;
use lexsync_provider::{CallKind, CallRecorder};

use crate::engine::{SyncEngine, SyncReport};
use crate::error::SyncError;

const REFERENCE_TYPE_KEYS: &[&str] = &["reference_type", "ref_type", "source"];
const REFERENCE_ID_KEYS: &[&str] = &["reference_id", "tracking_id"];
const JOB_ID_KEYS: &[&str] = &["request_id", "job_id"];
const RESPONSE_DATA_KEYS: &[&str] = &["response_data", "payload", "data"];
const NESTED_DATA_KEYS: &[&str] = &["response_data", "data"];
const ENVELOPE_KEYS: &[&str] = &["request_id", "job_id", "response_id", "response_data"];

/// What a delivery refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// A tracking subscription produced a new job.
    Tracking,
    /// A one-off search request completed.
    Request,
}

/// A parsed webhook delivery.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    pub reference_type: ReferenceType,
    pub reference_id: String,
    /// Job id carried by the delivery, when present.
    pub job_id: Option<String>,
    /// Result payload embedded in the delivery, when present.
    pub response_data: Option<Value>,
    /// The raw delivery, kept for the audit record.
    pub raw: Value,
}

impl WebhookEvent {
    /// Parse a raw delivery body. Returns `None` when the body carries no
    /// usable reference; such deliveries are acknowledged and dropped.
    pub fn parse(body: &Value) -> Option<Self> {
        let envelope = payload_envelope(body);
        let job_id = envelope
            .and_then(|env| first_str(env, JOB_ID_KEYS))
            .or_else(|| first_str(body, JOB_ID_KEYS))
            .map(str::to_string);
        let reference_type = match first_str(body, REFERENCE_TYPE_KEYS) {
            Some("tracking") => ReferenceType::Tracking,
            Some("request") => ReferenceType::Request,
            _ => {
                // Older deliveries omit the type; a tracking_id field
                // implies a subscription event.
                if body.get("tracking_id").and_then(Value::as_str).is_some() {
                    ReferenceType::Tracking
                } else if job_id.is_some() {
                    ReferenceType::Request
                } else {
                    return None;
                }
            }
        };
        let reference_id = match reference_type {
            ReferenceType::Tracking => first_str(body, REFERENCE_ID_KEYS)?.to_string(),
            ReferenceType::Request => job_id.clone()?,
        };
        let response_data = match envelope {
            Some(env) => NESTED_DATA_KEYS
                .iter()
                .filter_map(|key| env.get(key))
                .find(|v| !v.is_null())
                .cloned(),
            None => RESPONSE_DATA_KEYS
                .iter()
                .filter_map(|key| body.get(key))
                .find(|v| !v.is_null())
                .cloned(),
        };
        Some(Self {
            reference_type,
            reference_id,
            job_id,
            response_data,
            raw: body.clone(),
        })
    }
}

/// An enveloping `payload` object carrying the job reference and result
/// data one level down. A `payload` that is itself result data (an object
/// without any of the envelope keys, or an array) is left to the flat
/// data-key lookup.
fn payload_envelope(body: &Value) -> Option<&Value> {
    let payload = body.get("payload")?;
    let obj = payload.as_object()?;
    ENVELOPE_KEYS
        .iter()
        .any(|key| obj.contains_key(*key))
        .then_some(payload)
}

/// How a delivery was handled.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "disposition", rename_all = "snake_case")]
pub enum WebhookDisposition {
    /// New data; normalized and reconciled.
    Processed { report: SyncReport },
    /// The delivery's job id was already reconciled.
    Duplicate,
    /// The delivery could not be correlated to a monitored entity.
    UnknownReference,
    /// The body carried no usable reference.
    Malformed,
}

impl SyncEngine {
    /// Ingest one webhook delivery.
    ///
    /// Errors here are surfaced for logging only; the HTTP handler
    /// acknowledges the delivery either way.
    pub async fn ingest_webhook(&self, body: &Value) -> Result<WebhookDisposition, SyncError> {
        let Some(event) = WebhookEvent::parse(body) else {
            tracing::warn!("Webhook delivery carried no usable reference, dropping");
            return Ok(WebhookDisposition::Malformed);
        };

        let Some(entity) = self.correlate(&event).await? else {
            tracing::warn!(
                reference_id = %event.reference_id,
                "Webhook delivery does not match any monitored entity",
            );
            return Ok(WebhookDisposition::UnknownReference);
        };
        let ctx = TenantContext::new(entity.tenant_id);

        if let (Some(job_id), Some(stored)) = (&event.job_id, &entity.last_resolved_job_id) {
            if job_id == stored {
                tracing::debug!(
                    entity_id = entity.id,
                    job_id = %job_id,
                    "Webhook delivery for an already-reconciled job, skipping",
                );
                return Ok(WebhookDisposition::Duplicate);
            }
        }

        let mut recorder = CallRecorder::new();
        recorder.success(
            CallKind::WebhookIngest,
            "webhook",
            Some(event.raw.clone()),
            event.job_id.clone(),
        );

        let report = self.process_event(ctx, &entity, &event, &mut recorder).await;
        self.flush_recorder(ctx, Some(entity.id), &mut recorder).await;
        let report = report?;

        if let (Some(job_id), SyncReport::Completed { processes, .. }) = (&event.job_id, &report) {
            if event.reference_type == ReferenceType::Tracking {
                MonitoredEntityRepo::advance_subscription(
                    self.pool(),
                    entity.id,
                    job_id,
                    *processes as i64,
                    chrono::Utc::now(),
                )
                .await?;
            }
        }

        Ok(WebhookDisposition::Processed { report })
    }

    async fn correlate(&self, event: &WebhookEvent) -> Result<Option<MonitoredEntity>, SyncError> {
        match event.reference_type {
            ReferenceType::Tracking => {
                Ok(MonitoredEntityRepo::find_by_tracking_id(self.pool(), &event.reference_id).await?)
            }
            // One-off requests are correlated back through the audit log
            // entry written at submit time.
            ReferenceType::Request => {
                let Some(log) =
                    CallLogRepo::find_latest_by_job_id(self.pool(), &event.reference_id).await?
                else {
                    return Ok(None);
                };
                let Some(entity_id) = log.monitored_entity_id else {
                    return Ok(None);
                };
                Ok(MonitoredEntityRepo::find_by_id(self.pool(), log.tenant_id, entity_id).await?)
            }
        }
    }

    /// Reconcile the delivery's data, preferring the embedded payload and
    /// falling back to collecting the referenced job.
    async fn process_event(
        &self,
        ctx: TenantContext,
        entity: &MonitoredEntity,
        event: &WebhookEvent,
        recorder: &mut CallRecorder,
    ) -> Result<SyncReport, SyncError> {
        if let Some(items) = embedded_items(event.response_data.as_ref()) {
            return self
                .reconcile_items(ctx, entity, &items)
                .await;
        }

        let Some(job_id) = event.job_id.as_deref() else {
            return Ok(SyncReport::Empty);
        };
        let search_type = lexsync_provider::SearchType::parse(&entity.entity_kind)?;
        let (mode, budget) = self.mode_for_kind(search_type);
        let outcome = collect(self.transport(), job_id, mode, budget, recorder).await?;
        self.report_from_outcome(ctx, entity, job_id, mode, budget, outcome, recorder)
            .await
    }
}

/// Result items embedded in a delivery: an array of items, or a single
/// object treated as a one-item batch.
fn embedded_items(data: Option<&Value>) -> Option<Vec<Value>> {
    match data? {
        Value::Array(items) if !items.is_empty() => Some(items.clone()),
        obj @ Value::Object(_) => Some(vec![obj.clone()]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_tracking_delivery() {
        let body = json!({
            "reference_type": "tracking",
            "reference_id": "trk-1",
            "request_id": "job-9",
            "response_data": [{"code": "0001"}],
        });
        let event = WebhookEvent::parse(&body).unwrap();
        assert_eq!(event.reference_type, ReferenceType::Tracking);
        assert_eq!(event.reference_id, "trk-1");
        assert_eq!(event.job_id.as_deref(), Some("job-9"));
        assert!(event.response_data.is_some());
    }

    #[test]
    fn enveloped_delivery_unwraps_job_id_and_result_data() {
        let body = json!({
            "event_type": "tracking.updated",
            "reference_type": "tracking",
            "reference_id": "trk-1",
            "payload": {
                "request_id": "job-9",
                "response_id": "resp-3",
                "response_data": [{"code": "0001"}],
            },
        });
        let event = WebhookEvent::parse(&body).unwrap();
        assert_eq!(event.job_id.as_deref(), Some("job-9"));
        assert_eq!(event.response_data, Some(json!([{"code": "0001"}])));
    }

    #[test]
    fn enveloped_delivery_without_data_still_carries_job_id() {
        let body = json!({
            "reference_type": "request",
            "payload": {"request_id": "job-4"},
        });
        let event = WebhookEvent::parse(&body).unwrap();
        assert_eq!(event.reference_id, "job-4");
        assert_eq!(event.job_id.as_deref(), Some("job-4"));
        assert!(event.response_data.is_none());
    }

    #[test]
    fn payload_that_is_itself_result_data_is_kept_whole() {
        let body = json!({
            "reference_type": "tracking",
            "reference_id": "trk-3",
            "payload": {"code": "0002", "name": "A X B"},
        });
        let event = WebhookEvent::parse(&body).unwrap();
        assert!(event.job_id.is_none());
        assert_eq!(event.response_data, Some(json!({"code": "0002", "name": "A X B"})));
    }

    #[test]
    fn infers_tracking_from_tracking_id_field() {
        let body = json!({"tracking_id": "trk-2", "request_id": "job-1"});
        let event = WebhookEvent::parse(&body).unwrap();
        assert_eq!(event.reference_type, ReferenceType::Tracking);
        assert_eq!(event.reference_id, "trk-2");
    }

    #[test]
    fn request_delivery_uses_job_id_as_reference() {
        let body = json!({"reference_type": "request", "request_id": "job-7"});
        let event = WebhookEvent::parse(&body).unwrap();
        assert_eq!(event.reference_type, ReferenceType::Request);
        assert_eq!(event.reference_id, "job-7");
    }

    #[test]
    fn unusable_body_is_rejected() {
        assert!(WebhookEvent::parse(&json!({"hello": "world"})).is_none());
        assert!(WebhookEvent::parse(&json!({})).is_none());
    }

    #[test]
    fn embedded_object_becomes_single_item_batch() {
        let data = json!({"code": "0001"});
        let items = embedded_items(Some(&data)).unwrap();
        assert_eq!(items.len(), 1);

        assert!(embedded_items(Some(&Value::Null)).is_none());
        assert!(embedded_items(None).is_none());
    }
}
