//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use squarium_ingest::IngestionOrchestrator;
use squarium_storage::{ClusterQueryService, Database};

/// Shared application state.
///
/// All fields are cheap to clone; handlers receive a copy per request.
#[derive(Clone)]
pub struct AppState {
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    /// Read-side cluster queries.
    pub query_service: Arc<ClusterQueryService>,
    /// Runs ingestion cycles for the trigger endpoint.
    pub orchestrator: Arc<IngestionOrchestrator>,
    /// Bearer secret required by the trigger endpoint.
    pub cron_secret: Arc<str>,
    /// Port the server listens on, used for CORS origins.
    pub port: u16,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        database: Arc<Database>,
        orchestrator: Arc<IngestionOrchestrator>,
        cron_secret: &str,
        port: u16,
    ) -> Self {
        Self {
            query_service: Arc::new(ClusterQueryService::new(Arc::clone(&database))),
            database,
            orchestrator,
            cron_secret: Arc::from(cron_secret),
            port,
            start_time: Instant::now(),
        }
    }
}
