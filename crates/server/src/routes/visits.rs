// crates/server/src/routes/visits.rs
//! Visit logging and analytics endpoints.

use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use yearbook_db::{NewVisit, VisitRow, VisitStats};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordVisitRequest {
    pub subject: String,
    pub year: i32,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub referer: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordVisitResponse {
    pub recorded: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListVisitsQuery {
    pub year: Option<i32>,
    pub limit: Option<i64>,
}

/// POST /api/visit - Record a yearbook page view.
///
/// Repeat views from the same fingerprint within a short window are
/// reported as `recorded: false` and not stored again.
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<RecordVisitRequest>,
) -> ApiResult<Json<RecordVisitResponse>> {
    if req.subject.is_empty() {
        return Err(ApiError::BadRequest("subject is required".to_string()));
    }

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let visit = NewVisit {
        target_subject: req.subject,
        target_year: req.year,
        visitor_ip: Some(addr.ip().to_string()),
        visitor_fingerprint: req.fingerprint,
        country: req.country,
        city: req.city,
        latitude: req.latitude,
        longitude: req.longitude,
        user_agent,
        referer: req.referer,
    };

    let recorded = state.db.record_visit(&visit).await?;
    Ok(Json(RecordVisitResponse { recorded }))
}

/// GET /api/visits/{subject} - Recent visits, newest first.
pub async fn list_visits(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
    Query(query): Query<ListVisitsQuery>,
) -> ApiResult<Json<Vec<VisitRow>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let visits = state.db.list_visits(&subject, query.year, limit).await?;
    Ok(Json(visits))
}

/// GET /api/visits/{subject}/stats - Aggregated visit statistics.
pub async fn visit_stats(
    State(state): State<Arc<AppState>>,
    Path(subject): Path<String>,
) -> ApiResult<Json<VisitStats>> {
    let stats = state.db.visit_stats(&subject).await?;
    Ok(Json(stats))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/visit", post(record_visit))
        .route("/visits/{subject}", get(list_visits))
        .route("/visits/{subject}/stats", get(visit_stats))
}
