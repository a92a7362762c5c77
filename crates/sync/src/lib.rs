//! Orchestration of the synchronization paths.
//!
//! Two data flows converge here, per the platform's sync architecture:
//!
//! - **pull**: submit → collect → normalize → reconcile
//!   ([`SyncEngine::run_search`], [`SyncEngine::run_tracking_sync`]);
//! - **push**: webhook → correlate → normalize → reconcile
//!   ([`SyncEngine::ingest_webhook`]).
//!
//! Each invocation is stateless: concurrency safety comes from the
//! persistence layer's atomic upsert on the natural key, not from
//! in-process locks.

pub mod engine;
pub mod error;
pub mod reconciler;
pub mod webhook;

pub use engine::{SyncEngine, SyncReport, TrackingDrift};
pub use error::SyncError;
pub use reconciler::{ReconcileStats, Reconciler};
pub use webhook::{ReferenceType, WebhookDisposition, WebhookEvent};
