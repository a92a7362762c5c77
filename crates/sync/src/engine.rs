//! The synchronization engine: pull-path orchestration and tracking
//! lifecycle operations.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use lexsync_core::normalize::{normalize_batch, NormalizedProcess};
use lexsync_core::tracking::TrackingStatus;
use lexsync_core::types::TenantContext;
use lexsync_core::{CoreError, DbId};
use lexsync_db::models::call_log::CreateCallLog;
use lexsync_db::models::monitored_entity::MonitoredEntity;
use lexsync_db::repositories::{CallLogRepo, MonitoredEntityRepo};
use lexsync_db::DbPool;
use lexsync_provider::poll::{collect, PollBudget, PollMode, PollOutcome};
use lexsync_provider::submit::{submit_search, SubmitConfig, SubmitOutcome};
use lexsync_provider::tracking::{
    create_subscription, delete_subscription, resolve_subscription, sync_subscription,
    TrackingPoll, TrackingResolution,
};
use lexsync_provider::{CallRecorder, ProviderTransport, SearchType};

use crate::error::SyncError;
use crate::reconciler::Reconciler;

/// Delay before the single movement-detail re-fetch. The provider is
/// observed to populate movement detail slightly after the case cover.
const MOVEMENT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Outcome of one synchronization invocation.
///
/// Timeout, exhaustion, and lost-subscription are reports, not errors:
/// callers surface them as "try again later" / "re-activate monitoring"
/// rather than as failures.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncReport {
    /// Results were collected and reconciled.
    Completed {
        processes: usize,
        movements_inserted: usize,
        movements_skipped: usize,
        skipped_items: usize,
    },
    /// The job completed with zero results (e.g. sealed case).
    Empty,
    /// The poll budget elapsed before the job finished. Retryable.
    TimedOut,
    /// Every submission variant was rejected. Retryable; surfaced to
    /// users as "temporarily unavailable", not a hard error.
    Unavailable {
        last_status: Option<u16>,
        attempted: Vec<&'static str>,
    },
    /// The job reached a terminal error state upstream.
    Failed { message: String },
    /// The subscription has produced nothing new since the last sync.
    NothingNew,
    /// The subscription is unknown upstream; monitoring must be
    /// re-activated by an operator.
    SubscriptionLost,
    /// The entity has no pollable tracking subscription.
    NotTracked { reason: String },
}

/// Stored vs. provider-reported job id for one subscription, for
/// detecting drift caused by missed webhook deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingDrift {
    pub stored_job_id: Option<String>,
    pub provider_job_id: Option<String>,
    pub in_sync: bool,
}

/// Stateless per-invocation orchestrator. Cheap to clone; holds only the
/// pool, the transport handle, and timing configuration.
#[derive(Clone)]
pub struct SyncEngine {
    pool: DbPool,
    transport: Arc<dyn ProviderTransport>,
    submit_config: SubmitConfig,
    single_budget: PollBudget,
    detail_budget: PollBudget,
    movement_retry_delay: Duration,
}

impl SyncEngine {
    pub fn new(pool: DbPool, transport: Arc<dyn ProviderTransport>) -> Self {
        Self {
            pool,
            transport,
            submit_config: SubmitConfig::default(),
            single_budget: PollBudget::single_result(),
            detail_budget: PollBudget::detail(),
            movement_retry_delay: MOVEMENT_RETRY_DELAY,
        }
    }

    /// Override timing parameters (used by tests to avoid real waits).
    pub fn with_timing(
        mut self,
        submit_config: SubmitConfig,
        single_budget: PollBudget,
        detail_budget: PollBudget,
        movement_retry_delay: Duration,
    ) -> Self {
        self.submit_config = submit_config;
        self.single_budget = single_budget;
        self.detail_budget = detail_budget;
        self.movement_retry_delay = movement_retry_delay;
        self
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub(crate) fn transport(&self) -> &dyn ProviderTransport {
        self.transport.as_ref()
    }

    // -----------------------------------------------------------------
    // Pull path: one-off search
    // -----------------------------------------------------------------

    /// Submit a fresh search for a monitored entity and reconcile the
    /// collected results.
    pub async fn run_search(
        &self,
        ctx: TenantContext,
        entity_id: DbId,
    ) -> Result<SyncReport, SyncError> {
        let entity = self.load_entity(ctx, entity_id).await?;
        let search_type = SearchType::parse(&entity.entity_kind)?;
        let mut recorder = CallRecorder::new();

        let submitted = submit_search(
            self.transport.as_ref(),
            &self.submit_config,
            search_type,
            &entity.entity_key,
            &mut recorder,
        )
        .await;

        let (job_id, variant) = match submitted {
            Ok(SubmitOutcome::Submitted { job_id, variant }) => (job_id, variant),
            Ok(SubmitOutcome::Exhausted {
                last_status,
                attempted,
            }) => {
                self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;
                return Ok(SyncReport::Unavailable {
                    last_status,
                    attempted,
                });
            }
            Err(e) => {
                self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;
                return Err(e.into());
            }
        };
        tracing::info!(entity_id, job_id = %job_id, variant, "Search job submitted");

        let (mode, budget) = self.mode_for_kind(search_type);
        let outcome = collect(self.transport.as_ref(), &job_id, mode, budget, &mut recorder).await;
        let report = match outcome {
            Ok(outcome) => {
                self.report_from_outcome(ctx, &entity, &job_id, mode, budget, outcome, &mut recorder)
                    .await?
            }
            Err(e) => {
                self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;
                return Err(e.into());
            }
        };

        self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;
        Ok(report)
    }

    // -----------------------------------------------------------------
    // Pull path: tracking-driven sync
    // -----------------------------------------------------------------

    /// Resolve a subscription's latest job and reconcile its results.
    /// Used by the scheduled worker and by the manual "sync now" endpoint.
    pub async fn run_tracking_sync(
        &self,
        ctx: TenantContext,
        entity_id: DbId,
    ) -> Result<SyncReport, SyncError> {
        let entity = self.load_entity(ctx, entity_id).await?;
        let Some(tracking_id) = entity.tracking_id.clone() else {
            return Ok(SyncReport::NotTracked {
                reason: "monitoring has not been activated for this entity".into(),
            });
        };
        let status = entity.tracking_status()?;
        if !status.is_pollable() {
            return Ok(SyncReport::NotTracked {
                reason: format!("tracking subscription is {}", status.as_str()),
            });
        }

        let search_type = SearchType::parse(&entity.entity_kind)?;
        let (mode, budget) = self.mode_for_kind(search_type);
        let mut recorder = CallRecorder::new();

        let poll = sync_subscription(
            self.transport.as_ref(),
            &tracking_id,
            mode,
            budget,
            &mut recorder,
        )
        .await;

        let report = match poll {
            Ok(TrackingPoll::NoResultYet) => {
                MonitoredEntityRepo::mark_checked(&self.pool, entity.id).await?;
                SyncReport::NothingNew
            }
            Ok(TrackingPoll::SubscriptionLost) => {
                self.mark_subscription_lost(&entity).await?;
                SyncReport::SubscriptionLost
            }
            Ok(TrackingPoll::Result { job_id, outcome }) => {
                if entity.last_resolved_job_id.as_deref() == Some(job_id.as_str()) {
                    tracing::debug!(entity_id, job_id = %job_id, "Job already reconciled, nothing new");
                    MonitoredEntityRepo::mark_checked(&self.pool, entity.id).await?;
                    SyncReport::NothingNew
                } else {
                    let report = self
                        .report_from_outcome(
                            ctx, &entity, &job_id, mode, budget, outcome, &mut recorder,
                        )
                        .await?;
                    // Completed and Empty both consume the job; timeouts
                    // and failures leave the pointer so the next scan
                    // retries.
                    let received = match &report {
                        SyncReport::Completed { processes, .. } => Some(*processes as i64),
                        SyncReport::Empty => Some(0),
                        _ => None,
                    };
                    if let Some(received) = received {
                        MonitoredEntityRepo::advance_subscription(
                            &self.pool,
                            entity.id,
                            &job_id,
                            received,
                            chrono::Utc::now(),
                        )
                        .await?;
                    }
                    report
                }
            }
            Err(e) => {
                self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;
                return Err(e.into());
            }
        };

        self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;
        Ok(report)
    }

    // -----------------------------------------------------------------
    // Tracking lifecycle
    // -----------------------------------------------------------------

    /// Activate monitoring: create the provider-side subscription and
    /// store its id. The subscription starts in `pendente`.
    pub async fn activate_tracking(
        &self,
        ctx: TenantContext,
        entity_id: DbId,
        recurrence_days: i32,
    ) -> Result<String, SyncError> {
        let entity = self.load_entity(ctx, entity_id).await?;
        if entity.tracking_id.is_some() {
            return Err(CoreError::Conflict("monitoring is already active for this entity".into()).into());
        }
        let search_type = SearchType::parse(&entity.entity_kind)?;
        let mut recorder = CallRecorder::new();

        let result = create_subscription(
            self.transport.as_ref(),
            search_type,
            &entity.entity_key,
            recurrence_days,
            &mut recorder,
        )
        .await;
        self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;

        let tracking_id = result?;
        MonitoredEntityRepo::set_tracking(&self.pool, entity_id, &tracking_id, recurrence_days)
            .await?;
        Ok(tracking_id)
    }

    /// Deactivate monitoring: tear down the provider-side subscription
    /// and clear the stored tracking fields.
    pub async fn deactivate_tracking(
        &self,
        ctx: TenantContext,
        entity_id: DbId,
    ) -> Result<(), SyncError> {
        let entity = self.load_entity(ctx, entity_id).await?;
        let Some(tracking_id) = entity.tracking_id.clone() else {
            return Ok(());
        };
        let mut recorder = CallRecorder::new();
        let result =
            delete_subscription(self.transport.as_ref(), &tracking_id, &mut recorder).await;
        self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;
        result?;
        MonitoredEntityRepo::clear_tracking(&self.pool, entity_id).await?;
        Ok(())
    }

    /// Operator pause: no polling happens while paused.
    pub async fn pause_tracking(&self, ctx: TenantContext, entity_id: DbId) -> Result<(), SyncError> {
        self.transition_tracking(ctx, entity_id, TrackingStatus::Pausado).await
    }

    /// Operator resume from pause.
    pub async fn resume_tracking(&self, ctx: TenantContext, entity_id: DbId) -> Result<(), SyncError> {
        self.transition_tracking(ctx, entity_id, TrackingStatus::Ativo).await
    }

    /// Re-activate a subscription that entered `erro`, sending it back
    /// through `pendente`.
    pub async fn reactivate_tracking(
        &self,
        ctx: TenantContext,
        entity_id: DbId,
    ) -> Result<(), SyncError> {
        self.transition_tracking(ctx, entity_id, TrackingStatus::Pendente).await
    }

    /// Diagnostic: the provider's current job id for a subscription next
    /// to the locally stored one, to detect drift from dropped webhooks.
    pub async fn tracking_drift(
        &self,
        ctx: TenantContext,
        entity_id: DbId,
    ) -> Result<TrackingDrift, SyncError> {
        let entity = self.load_entity(ctx, entity_id).await?;
        let Some(tracking_id) = entity.tracking_id.clone() else {
            return Err(CoreError::Validation("entity has no tracking subscription".into()).into());
        };
        let mut recorder = CallRecorder::new();
        let resolution =
            resolve_subscription(self.transport.as_ref(), &tracking_id, &mut recorder).await;
        self.flush_recorder(ctx, Some(entity_id), &mut recorder).await;

        let provider_job_id = match resolution? {
            TrackingResolution::Resolved { job_id } => Some(job_id),
            TrackingResolution::NoResultYet | TrackingResolution::SubscriptionLost => None,
        };
        let stored_job_id = entity.last_resolved_job_id.clone();
        let in_sync = stored_job_id == provider_job_id;
        Ok(TrackingDrift {
            stored_job_id,
            provider_job_id,
            in_sync,
        })
    }

    // -----------------------------------------------------------------
    // Shared internals
    // -----------------------------------------------------------------

    async fn load_entity(
        &self,
        ctx: TenantContext,
        entity_id: DbId,
    ) -> Result<MonitoredEntity, SyncError> {
        MonitoredEntityRepo::find_by_id(&self.pool, ctx.tenant_id, entity_id)
            .await?
            .ok_or_else(|| {
                SyncError::Core(CoreError::NotFound {
                    entity: "MonitoredEntity",
                    id: entity_id,
                })
            })
    }

    pub(crate) fn mode_for_kind(&self, search_type: SearchType) -> (PollMode, PollBudget) {
        match search_type {
            // Single-case detail jobs report inline and need the longer
            // budget with a startup grace period.
            SearchType::LawsuitCnj => (PollMode::Status, self.detail_budget),
            // Identity-wide searches can span many result pages.
            SearchType::Oab | SearchType::Cnpj => (PollMode::Paginated, self.single_budget),
        }
    }

    /// Turn a poll outcome into a report, reconciling on completion.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn report_from_outcome(
        &self,
        ctx: TenantContext,
        entity: &MonitoredEntity,
        job_id: &str,
        mode: PollMode,
        budget: PollBudget,
        outcome: PollOutcome,
        recorder: &mut CallRecorder,
    ) -> Result<SyncReport, SyncError> {
        let mut items = match outcome {
            PollOutcome::Completed(items) => items,
            PollOutcome::TimedOut { attempts } => {
                tracing::warn!(entity_id = entity.id, job_id, attempts, "Sync timed out");
                return Ok(SyncReport::TimedOut);
            }
            PollOutcome::Failed { message } => {
                return Ok(SyncReport::Failed { message });
            }
        };

        // The provider sometimes populates movement detail slightly
        // after the cover data; one bounded re-fetch covers that window.
        if !items.is_empty() {
            let (processes, _) = normalize_batch(&items);
            if !processes.is_empty() && processes.iter().all(|p| p.movements.is_empty()) {
                tracing::debug!(job_id, "No movements in first pass, re-fetching once");
                tokio::time::sleep(self.movement_retry_delay).await;
                if let PollOutcome::Completed(retry_items) =
                    collect(self.transport.as_ref(), job_id, mode, budget, recorder).await?
                {
                    let (retry_processes, _) = normalize_batch(&retry_items);
                    if retry_processes.iter().any(|p| !p.movements.is_empty()) {
                        items = retry_items;
                    }
                }
            }
        }

        self.reconcile_items(ctx, entity, &items).await
    }

    /// Normalize a completed batch and persist it.
    pub(crate) async fn reconcile_items(
        &self,
        ctx: TenantContext,
        entity: &MonitoredEntity,
        items: &[serde_json::Value],
    ) -> Result<SyncReport, SyncError> {
        if items.is_empty() {
            // Sealed/restricted single-case searches still get a
            // placeholder record flagged as incomplete.
            if entity.entity_kind == SearchType::LawsuitCnj.as_str() {
                let placeholder = placeholder_process(&entity.entity_key);
                Reconciler::apply(&self.pool, ctx, entity.id, &placeholder).await?;
            }
            return Ok(SyncReport::Empty);
        }

        let (processes, skipped_items) = normalize_batch(items);

        let mut movements_inserted = 0;
        let mut movements_skipped = 0;
        for normalized in &processes {
            let stats = Reconciler::apply(&self.pool, ctx, entity.id, normalized).await?;
            movements_inserted += stats.movements_inserted;
            movements_skipped += stats.movements_skipped;
        }

        Ok(SyncReport::Completed {
            processes: processes.len(),
            movements_inserted,
            movements_skipped,
            skipped_items,
        })
    }

    async fn mark_subscription_lost(&self, entity: &MonitoredEntity) -> Result<(), SyncError> {
        let next = entity.tracking_status()?.transition_to(TrackingStatus::Erro)?;
        MonitoredEntityRepo::set_status(&self.pool, entity.id, next).await?;
        tracing::warn!(
            entity_id = entity.id,
            "Subscription lost upstream; monitoring set to erro until re-activated",
        );
        Ok(())
    }

    async fn transition_tracking(
        &self,
        ctx: TenantContext,
        entity_id: DbId,
        next: TrackingStatus,
    ) -> Result<(), SyncError> {
        let entity = self.load_entity(ctx, entity_id).await?;
        let validated = entity.tracking_status()?.transition_to(next)?;
        MonitoredEntityRepo::set_status(&self.pool, entity_id, validated).await?;
        Ok(())
    }

    /// Flush captured call records to the audit log. Logging failures are
    /// reported but never fail the sync operation itself.
    pub(crate) async fn flush_recorder(
        &self,
        ctx: TenantContext,
        entity_id: Option<DbId>,
        recorder: &mut CallRecorder,
    ) {
        for record in recorder.take() {
            let input = CreateCallLog {
                tenant_id: ctx.tenant_id,
                user_id: ctx.user_id,
                monitored_entity_id: entity_id,
                call_kind: record.kind.as_str().to_string(),
                endpoint: record.endpoint,
                request_payload: record.request_payload,
                job_id: record.job_id,
                success: record.success,
                http_status: record.http_status.map(i32::from),
                error_text: record.error_text,
                cost_estimate: record.cost_estimate,
            };
            if let Err(e) = CallLogRepo::record(&self.pool, &input).await {
                tracing::error!(error = %e, "Failed to write API call log entry");
            }
        }
    }
}

/// Minimal incomplete projection for a sealed/restricted case where only
/// the case number is known.
fn placeholder_process(case_number: &str) -> NormalizedProcess {
    NormalizedProcess {
        case_number: case_number.to_string(),
        active_party: String::new(),
        passive_party: String::new(),
        court_name: None,
        court_acronym: None,
        phase: None,
        status: None,
        filing_value: None,
        raw: json!({}),
        details_complete: false,
        movements: Vec::new(),
    }
}
