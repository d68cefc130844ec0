// crates/server/src/routes/stats.rs
//! Yearbook statistics endpoints.
//!
//! The year endpoints go through the caching aggregation service; the
//! date-range endpoint always fetches fresh. When no token is supplied the
//! handler falls back to a stored valid token for the subject, so saved
//! credentials transparently upgrade a public view to the rich one.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use yearbook_core::ContributionRecord;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GitHub launched in 2008; earlier years cannot have data.
const MIN_YEAR: i32 = 2008;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub token: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub record: ContributionRecord,
    pub cached: bool,
}

fn validate_year(year: i32) -> ApiResult<()> {
    let current = Utc::now().year();
    if year < MIN_YEAR || year > current {
        return Err(ApiError::BadRequest(format!(
            "year must be between {MIN_YEAR} and {current}"
        )));
    }
    Ok(())
}

fn parse_date(s: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("invalid date: {s} (expected YYYY-MM-DD)")))
}

/// Resolve the credential for a request: an explicit token wins, otherwise
/// a stored valid token for the subject is used.
pub(crate) async fn resolve_credential(
    state: &AppState,
    subject: &str,
    explicit: Option<String>,
) -> ApiResult<Option<String>> {
    if let Some(token) = explicit.filter(|t| !t.is_empty()) {
        return Ok(Some(token));
    }
    Ok(state
        .db
        .get_valid_token(subject)
        .await?
        .map(|t| t.github_token))
}

/// GET /api/stats/{subject}/{year} - Yearbook statistics for a calendar year.
pub async fn get_year_stats(
    State(state): State<Arc<AppState>>,
    Path((subject, year)): Path<(String, i32)>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<StatsResponse>> {
    validate_year(year)?;
    let credential = resolve_credential(&state, &subject, query.token).await?;

    let outcome = state
        .stats
        .stats_for_year(&subject, year, credential.as_deref(), query.refresh)
        .await?;

    Ok(Json(StatsResponse {
        record: outcome.record,
        cached: outcome.cached,
    }))
}

/// POST /api/stats/{subject}/{year}/refresh - Force a refetch.
pub async fn refresh_year_stats(
    State(state): State<Arc<AppState>>,
    Path((subject, year)): Path<(String, i32)>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<StatsResponse>> {
    validate_year(year)?;
    let credential = resolve_credential(&state, &subject, query.token).await?;

    let outcome = state
        .stats
        .stats_for_year(&subject, year, credential.as_deref(), true)
        .await?;

    Ok(Json(StatsResponse {
        record: outcome.record,
        cached: outcome.cached,
    }))
}

/// GET /api/stats/{subject}/{start}/{end} - Arbitrary inclusive date range.
pub async fn get_range_stats(
    State(state): State<Arc<AppState>>,
    Path((subject, start, end)): Path<(String, String, String)>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<StatsResponse>> {
    let start = parse_date(&start)?;
    let end = parse_date(&end)?;
    let credential = resolve_credential(&state, &subject, query.token).await?;

    let record = state
        .stats
        .stats_for_range(&subject, start, end, credential.as_deref())
        .await?;

    Ok(Json(StatsResponse {
        record,
        cached: false,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats/{subject}/{year}", get(get_year_stats))
        .route("/stats/{subject}/{year}/refresh", post(refresh_year_stats))
        .route("/stats/{subject}/{start}/{end}", get(get_range_stats))
}
