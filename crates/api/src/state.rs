use std::sync::Arc;

use lexsync_sync::SyncEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: lexsync_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Synchronization engine (shared with the scheduler worker).
    pub engine: Arc<SyncEngine>,
}
