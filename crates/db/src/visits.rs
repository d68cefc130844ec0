// crates/db/src/visits.rs
//! Visit logging and aggregation.
//!
//! Each page view on a yearbook records where the visitor came from. A
//! fingerprint plus a five minute window suppresses duplicate rows from
//! rapid refreshes.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::Row;

use crate::{Database, DbResult};

/// Window inside which a repeat view from the same fingerprint is folded
/// into the earlier row.
pub const DEDUP_WINDOW_MINUTES: i64 = 5;

const MAX_COUNTRIES: i64 = 20;
const MAX_MAP_POINTS: i64 = 100;

/// A visit as submitted by the HTTP layer.
#[derive(Debug, Clone, Default)]
pub struct NewVisit {
    pub target_subject: String,
    pub target_year: i32,
    pub visitor_ip: Option<String>,
    pub visitor_fingerprint: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

/// A stored visit row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRow {
    pub id: i64,
    pub target_subject: String,
    pub target_year: i32,
    pub country: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub referer: Option<String>,
    pub visited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountryCount {
    pub country: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitStats {
    pub total_visits: i64,
    pub by_country: Vec<CountryCount>,
    pub map_points: Vec<MapPoint>,
}

fn row_to_visit(row: &sqlx::sqlite::SqliteRow) -> Result<VisitRow, sqlx::Error> {
    Ok(VisitRow {
        id: row.try_get("id")?,
        target_subject: row.try_get("target_subject")?,
        target_year: row.try_get::<i64, _>("target_year")? as i32,
        country: row.try_get("visitor_country")?,
        city: row.try_get("visitor_city")?,
        latitude: row.try_get("visitor_lat")?,
        longitude: row.try_get("visitor_lng")?,
        referer: row.try_get("referer")?,
        visited_at: DateTime::<Utc>::from_timestamp(row.try_get("visited_at")?, 0)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}

impl Database {
    /// Record a visit. Returns false when a recent row with the same
    /// fingerprint for the same yearbook already exists.
    pub async fn record_visit(&self, visit: &NewVisit) -> DbResult<bool> {
        if let Some(fp) = visit.visitor_fingerprint.as_deref() {
            if self
                .has_recent_visit(&visit.target_subject, visit.target_year, fp)
                .await?
            {
                return Ok(false);
            }
        }

        sqlx::query(
            r#"INSERT INTO visit_logs
                (target_subject, target_year, visitor_ip, visitor_fingerprint,
                 visitor_country, visitor_city, visitor_lat, visitor_lng,
                 visitor_user_agent, referer, visited_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&visit.target_subject)
        .bind(visit.target_year as i64)
        .bind(&visit.visitor_ip)
        .bind(&visit.visitor_fingerprint)
        .bind(&visit.country)
        .bind(&visit.city)
        .bind(visit.latitude)
        .bind(visit.longitude)
        .bind(&visit.user_agent)
        .bind(&visit.referer)
        .bind(Utc::now().timestamp())
        .execute(self.pool())
        .await?;
        Ok(true)
    }

    async fn has_recent_visit(
        &self,
        subject: &str,
        year: i32,
        fingerprint: &str,
    ) -> DbResult<bool> {
        let cutoff = (Utc::now() - Duration::minutes(DEDUP_WINDOW_MINUTES)).timestamp();
        let row = sqlx::query(
            r#"SELECT id FROM visit_logs
            WHERE target_subject = ? AND target_year = ?
              AND visitor_fingerprint = ? AND visited_at >= ?
            LIMIT 1"#,
        )
        .bind(subject)
        .bind(year as i64)
        .bind(fingerprint)
        .bind(cutoff)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.is_some())
    }

    /// Recent visits for a subject, newest first. `year` narrows to one
    /// yearbook when given.
    pub async fn list_visits(
        &self,
        subject: &str,
        year: Option<i32>,
        limit: i64,
    ) -> DbResult<Vec<VisitRow>> {
        let rows = match year {
            Some(year) => {
                sqlx::query(
                    r#"SELECT * FROM visit_logs
                    WHERE target_subject = ? AND target_year = ?
                    ORDER BY visited_at DESC LIMIT ?"#,
                )
                .bind(subject)
                .bind(year as i64)
                .bind(limit)
                .fetch_all(self.pool())
                .await?
            }
            None => {
                sqlx::query(
                    r#"SELECT * FROM visit_logs
                    WHERE target_subject = ?
                    ORDER BY visited_at DESC LIMIT ?"#,
                )
                .bind(subject)
                .bind(limit)
                .fetch_all(self.pool())
                .await?
            }
        };

        rows.iter().map(row_to_visit).collect::<Result<_, _>>().map_err(Into::into)
    }

    /// Aggregate view of a subject's visitors: total count, top countries,
    /// and coordinates for a map.
    pub async fn visit_stats(&self, subject: &str) -> DbResult<VisitStats> {
        let total_visits: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM visit_logs WHERE target_subject = ?")
                .bind(subject)
                .fetch_one(self.pool())
                .await?;

        let by_country = sqlx::query_as::<_, (String, i64)>(
            r#"SELECT visitor_country, COUNT(*) as n FROM visit_logs
            WHERE target_subject = ? AND visitor_country IS NOT NULL
            GROUP BY visitor_country ORDER BY n DESC LIMIT ?"#,
        )
        .bind(subject)
        .bind(MAX_COUNTRIES)
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(|(country, count)| CountryCount { country, count })
        .collect();

        let map_points = sqlx::query_as::<_, (f64, f64, Option<String>, Option<String>)>(
            r#"SELECT visitor_lat, visitor_lng, visitor_city, visitor_country FROM visit_logs
            WHERE target_subject = ? AND visitor_lat IS NOT NULL AND visitor_lng IS NOT NULL
            ORDER BY visited_at DESC LIMIT ?"#,
        )
        .bind(subject)
        .bind(MAX_MAP_POINTS)
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .map(|(latitude, longitude, city, country)| MapPoint {
            latitude,
            longitude,
            city,
            country,
        })
        .collect();

        Ok(VisitStats {
            total_visits,
            by_country,
            map_points,
        })
    }
}
