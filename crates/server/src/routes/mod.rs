//! API route handlers for the yearbook server.

pub mod card;
pub mod health;
pub mod stats;
pub mod tokens;
pub mod visits;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Health check
/// - GET /api/stats/{subject}/{year} - Yearbook statistics (cached)
/// - POST /api/stats/{subject}/{year}/refresh - Force refetch
/// - GET /api/stats/{subject}/{start}/{end} - Arbitrary date range (uncached)
/// - GET /api/card/{subject}/{year} - SVG stats card
/// - POST /api/token - Store a GitHub token
/// - GET /api/token/{username} - Stored token status (masked)
/// - DELETE /api/token/{username} - Delete a stored token
/// - POST /api/visit - Record a yearbook visit
/// - GET /api/visits/{subject} - Recent visits
/// - GET /api/visits/{subject}/stats - Aggregated visit statistics
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", stats::router())
        .nest("/api", card::router())
        .nest("/api", tokens::router())
        .nest("/api", visits::router())
        .with_state(state)
}
