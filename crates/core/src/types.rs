// crates/core/src/types.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One calendar day's contribution count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyContribution {
    pub date: NaiveDate,
    pub count: i64,
}

impl DailyContribution {
    pub fn new(date: NaiveDate, count: i64) -> Self {
        Self { date, count }
    }
}

/// Per-language byte sizes accumulated across repositories.
///
/// `percentage` is 0 until the normalizer computes it from the total size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageStat {
    pub name: String,
    pub color: String,
    pub size: i64,
    pub repo_count: i64,
    #[serde(default)]
    pub percentage: f64,
}

/// A repository with its commit-contribution count for the queried range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoContribution {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    pub count: i64,
    pub is_private: bool,
    pub stars: i64,
    pub forks: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// An organization the subject belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub login: String,
    pub avatar_url: String,
}

/// Uniform pre-normalization shape produced by both upstream fetch paths.
///
/// The restricted (unauthenticated) path cannot see pull requests, reviews,
/// issues, private repositories, languages or organizations; those fields are
/// zero/empty there, never omitted, so the normalizer consumes one shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawActivity {
    pub subject: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub followers: i64,
    pub following: i64,
    pub public_repos: i64,
    pub private_repos: i64,
    pub total_repos: i64,
    pub total_contributions: i64,
    pub total_commits: i64,
    pub pull_requests: i64,
    pub pull_request_reviews: i64,
    pub issues: i64,
    /// Ascending by date; one entry per day the source reported.
    pub daily_contributions: Vec<DailyContribution>,
    /// In fetch order; the normalizer ranks them.
    pub repo_contributions: Vec<RepoContribution>,
    /// Raw byte sizes; the normalizer computes percentages and sorts.
    pub language_stats: Vec<LanguageStat>,
    pub organizations: Vec<Organization>,
}

/// Canonical persisted statistics record, one per (subject, year).
///
/// Immutable once returned to a caller; a refresh replaces the whole record
/// (delete old, insert new), never patches fields, so no reader observes a
/// mix of two upstream snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionRecord {
    pub subject: String,
    pub year: i32,

    // Profile snapshot, captured at fetch time.
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub followers: i64,
    pub following: i64,

    // Totals.
    pub total_contributions: i64,
    pub total_commits: i64,
    pub pull_requests: i64,
    pub pull_request_reviews: i64,
    pub issues: i64,

    // Streaks. `current_streak` is anchored to the record's end boundary
    // (Dec 31 of `year`, or the supplied range end), not "now".
    pub longest_streak: i64,
    pub current_streak: i64,
    pub active_days: i64,

    // Repository summary. Upstream counts may be inconsistent, so
    // public + private <= total is deliberately not asserted.
    pub repo_count: i64,
    pub public_repo_count: i64,
    pub private_repo_count: i64,
    pub total_repo_count: i64,

    pub daily_contributions: Vec<DailyContribution>,
    pub language_stats: Vec<LanguageStat>,
    pub top_repos: Vec<RepoContribution>,
    pub organizations: Vec<Organization>,

    /// Freshness anchor for cache validation.
    pub updated_at: DateTime<Utc>,
}
