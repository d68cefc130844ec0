// crates/server/src/state.rs
//! Application state for the Axum server.

use std::time::Instant;

use yearbook_db::Database;
use yearbook_github::GithubClient;

use crate::aggregate::AggregationService;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Database handle, used directly by the token and visit routes.
    pub db: Database,
    /// Orchestrator for the cache -> probe -> fetch -> normalize pipeline.
    pub stats: AggregationService,
}

impl AppState {
    pub fn new(db: Database, github: GithubClient) -> Self {
        Self {
            start_time: Instant::now(),
            stats: AggregationService::new(db.clone(), github),
            db,
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
