//! Scheduled sync worker.
//!
//! Periodically scans for tracking subscriptions whose recurrence
//! interval has elapsed and syncs them one at a time. Subscriptions are
//! processed sequentially on purpose: the provider rate-limits
//! aggressively, and the per-entity poll budgets already bound how long
//! a scan cycle can take.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lexsync_core::types::TenantContext;
use lexsync_db::repositories::MonitoredEntityRepo;
use lexsync_provider::{HttpTransport, ProviderConfig};
use lexsync_sync::{SyncEngine, SyncReport};

/// How often the worker looks for due subscriptions.
const SCAN_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lexsync_worker=debug,lexsync_sync=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = lexsync_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    lexsync_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database ready");

    let provider_config = ProviderConfig::from_env().expect("Invalid provider configuration");
    let transport = Arc::new(HttpTransport::new(provider_config));
    let engine = SyncEngine::new(pool.clone(), transport);

    tracing::info!(scan_interval_secs = SCAN_INTERVAL.as_secs(), "Worker started");

    let mut ticker = tokio::time::interval(SCAN_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                scan_once(&pool, &engine).await;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT (Ctrl-C), shutting down");
                break;
            }
        }
    }

    tracing::info!("Worker stopped");
}

/// One scan cycle: sync every due subscription, sequentially.
async fn scan_once(pool: &lexsync_db::DbPool, engine: &SyncEngine) {
    let due = match MonitoredEntityRepo::list_due_for_sync(pool).await {
        Ok(due) => due,
        Err(e) => {
            tracing::error!(error = %e, "Failed to scan for due subscriptions");
            return;
        }
    };
    if due.is_empty() {
        return;
    }
    tracing::info!(count = due.len(), "Syncing due subscriptions");

    for entity in due {
        let ctx = TenantContext::new(entity.tenant_id);
        match engine.run_tracking_sync(ctx, entity.id).await {
            Ok(SyncReport::Completed {
                processes,
                movements_inserted,
                ..
            }) => {
                tracing::info!(
                    entity_id = entity.id,
                    processes,
                    movements_inserted,
                    "Subscription synced",
                );
            }
            Ok(SyncReport::NothingNew) => {
                tracing::debug!(entity_id = entity.id, "Nothing new");
            }
            Ok(SyncReport::SubscriptionLost) => {
                tracing::warn!(
                    entity_id = entity.id,
                    "Subscription lost upstream; operator re-activation required",
                );
            }
            Ok(report) => {
                tracing::info!(entity_id = entity.id, ?report, "Sync finished");
            }
            Err(e) => {
                tracing::error!(entity_id = entity.id, error = %e, "Sync failed");
            }
        }
    }
}
