// crates/server/src/aggregate.rs
//! Orchestrator for the cache -> probe -> fetch -> normalize -> store
//! pipeline.
//!
//! Cache hits are revalidated with a cheap upstream probe. The staleness
//! policy fails open: if the probe errors or yields no signal the cached
//! record is served as-is, because stale-but-present beats an error page.
//! Full-fetch failures are never swallowed.

use chrono::{Datelike, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use yearbook_core::{normalize, year_range, ContributionRecord};
use yearbook_db::{Database, DbError};
use yearbook_github::{GithubClient, UpstreamError};

#[derive(Debug, Error)]
pub enum AggregationError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] DbError),

    #[error("{0}")]
    InvalidRange(String),
}

/// A record plus whether it was served from the cache.
#[derive(Debug, Clone)]
pub struct StatsOutcome {
    pub record: ContributionRecord,
    pub cached: bool,
}

/// Stateless beyond its two handles; cheap to clone.
#[derive(Clone)]
pub struct AggregationService {
    db: Database,
    github: GithubClient,
}

impl AggregationService {
    pub fn new(db: Database, github: GithubClient) -> Self {
        Self { db, github }
    }

    /// Statistics for `subject` over calendar year `year`.
    ///
    /// Serves the cached record when the upstream probe shows no activity
    /// newer than it. `force_refresh` skips the cache lookup entirely.
    pub async fn stats_for_year(
        &self,
        subject: &str,
        year: i32,
        credential: Option<&str>,
        force_refresh: bool,
    ) -> Result<StatsOutcome, AggregationError> {
        let (start, end) = year_range(year)
            .ok_or_else(|| AggregationError::InvalidRange(format!("invalid year: {year}")))?;

        if !force_refresh {
            if let Some(cached) = self.db.get_record(subject, year).await? {
                if self.is_still_fresh(subject, &cached, credential).await {
                    debug!(subject, year, "serving cached record");
                    return Ok(StatsOutcome {
                        record: cached,
                        cached: true,
                    });
                }
            }
        }

        let record = self.refresh(subject, year, start, end, credential).await?;
        Ok(StatsOutcome {
            record,
            cached: false,
        })
    }

    /// Statistics over an arbitrary inclusive date range. Never cached:
    /// the cache is keyed by calendar year only.
    pub async fn stats_for_range(
        &self,
        subject: &str,
        start: NaiveDate,
        end: NaiveDate,
        credential: Option<&str>,
    ) -> Result<ContributionRecord, AggregationError> {
        if start > end {
            return Err(AggregationError::InvalidRange(format!(
                "start {start} is after end {end}"
            )));
        }

        let raw = self
            .github
            .fetch_activity(subject, start, end, credential)
            .await?;
        Ok(normalize(&raw, start.year(), end, Utc::now()))
    }

    /// Probe-based revalidation. Any probe failure or missing signal counts
    /// as fresh.
    async fn is_still_fresh(
        &self,
        subject: &str,
        cached: &ContributionRecord,
        credential: Option<&str>,
    ) -> bool {
        match self.github.probe_latest_activity(subject, credential).await {
            Ok(Some(latest)) => latest <= cached.updated_at,
            Ok(None) => true,
            Err(err) => {
                warn!(subject, error = %err, "staleness probe failed, serving cached record");
                true
            }
        }
    }

    /// Drop the cached record, fetch fresh activity, normalize and store.
    ///
    /// The old record is deleted before the fetch so a malformed or failed
    /// refresh never leaves a half-replaced row behind.
    async fn refresh(
        &self,
        subject: &str,
        year: i32,
        start: NaiveDate,
        end: NaiveDate,
        credential: Option<&str>,
    ) -> Result<ContributionRecord, AggregationError> {
        self.db.invalidate_record(subject, year).await?;

        let raw = self
            .github
            .fetch_activity(subject, start, end, credential)
            .await?;
        let record = normalize(&raw, year, end, Utc::now());
        self.db.put_record(&record).await?;

        info!(
            subject,
            year,
            total = record.total_contributions,
            "refreshed contribution record"
        );
        Ok(record)
    }
}
