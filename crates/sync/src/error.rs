use lexsync_core::CoreError;
use lexsync_provider::ProviderError;

/// Orchestration-level error type.
///
/// Wraps the provider and persistence errors. Outcome-like conditions
/// (timeout, exhaustion, lost subscription) never appear here; they are
/// carried by [`crate::SyncReport`] so callers can distinguish "retry
/// later" from "this failed".
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
