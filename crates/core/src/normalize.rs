// crates/core/src/normalize.rs
//! Turn a `RawActivity` payload into the canonical `ContributionRecord`.
//!
//! Everything here is pure: no I/O, no clock reads. The only timestamp in
//! the output is the caller-supplied `updated_at`, so normalizing the same
//! payload twice yields identical records.

use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::HashSet;

use crate::types::{ContributionRecord, DailyContribution, LanguageStat, RawActivity};

/// Upper bound on the backward current-streak walk.
const MAX_STREAK_DAYS: u64 = 365;

/// Number of week buckets rendered by the activity graph.
pub const WEEK_BUCKETS: usize = 52;

/// Normalize a raw upstream payload into the canonical record for `year`.
///
/// `end_anchor` is the day the current streak counts backward from: Dec 31
/// of `year` for calendar-year queries, or the supplied end date for
/// arbitrary ranges. `updated_at` becomes the record's freshness anchor.
pub fn normalize(
    raw: &RawActivity,
    year: i32,
    end_anchor: NaiveDate,
    updated_at: DateTime<Utc>,
) -> ContributionRecord {
    let active_days: Vec<NaiveDate> = raw
        .daily_contributions
        .iter()
        .filter(|d| d.count > 0)
        .map(|d| d.date)
        .collect();

    let mut top_repos = raw.repo_contributions.clone();
    // Stable: ties keep original fetch order.
    top_repos.sort_by(|a, b| b.count.cmp(&a.count));

    ContributionRecord {
        subject: raw.subject.clone(),
        year,
        avatar_url: raw.avatar_url.clone(),
        bio: raw.bio.clone(),
        company: raw.company.clone(),
        location: raw.location.clone(),
        followers: raw.followers,
        following: raw.following,
        total_contributions: raw.total_contributions,
        total_commits: raw.total_commits,
        pull_requests: raw.pull_requests,
        pull_request_reviews: raw.pull_request_reviews,
        issues: raw.issues,
        longest_streak: longest_streak(&active_days),
        current_streak: current_streak(&active_days, end_anchor),
        active_days: active_days.len() as i64,
        repo_count: top_repos.len() as i64,
        public_repo_count: raw.public_repos,
        private_repo_count: raw.private_repos,
        total_repo_count: raw.total_repos,
        daily_contributions: raw.daily_contributions.clone(),
        language_stats: language_percentages(&raw.language_stats),
        top_repos,
        organizations: raw.organizations.clone(),
        updated_at,
    }
}

/// Longest run of consecutive active days.
///
/// A gap of exactly one calendar day continues a run; any other gap starts
/// a new run of length 1. The final open run counts.
pub fn longest_streak(active_days: &[NaiveDate]) -> i64 {
    let mut days = active_days.to_vec();
    days.sort_unstable();
    days.dedup();

    let mut longest: i64 = 0;
    let mut run: i64 = 0;
    let mut prev: Option<NaiveDate> = None;

    for day in days {
        match prev {
            Some(p) if day == p + Days::new(1) => run += 1,
            _ => {
                longest = longest.max(run);
                run = 1;
            }
        }
        prev = Some(day);
    }
    longest.max(run)
}

/// Consecutive active days counted backward from `end_anchor`.
///
/// The walk stops at the first inactive day, so an inactive anchor day
/// yields 0 (the streak has not started yet). Bounded to 365 steps.
pub fn current_streak(active_days: &[NaiveDate], end_anchor: NaiveDate) -> i64 {
    let active: HashSet<NaiveDate> = active_days.iter().copied().collect();

    let mut streak: i64 = 0;
    for i in 0..MAX_STREAK_DAYS {
        let Some(day) = end_anchor.checked_sub_days(Days::new(i)) else {
            break;
        };
        if active.contains(&day) {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

/// Compute percentages from raw byte sizes and sort descending by size.
///
/// A zero total yields 0% everywhere rather than dividing by zero.
pub fn language_percentages(raw: &[LanguageStat]) -> Vec<LanguageStat> {
    let total: i64 = raw.iter().map(|l| l.size).sum();

    let mut stats: Vec<LanguageStat> = raw
        .iter()
        .map(|l| LanguageStat {
            percentage: if total > 0 {
                l.size as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            ..l.clone()
        })
        .collect();
    stats.sort_by(|a, b| b.size.cmp(&a.size));
    stats
}

/// Sum daily counts into 52 week buckets for the activity graph.
///
/// Bucket index is `(date - range_start).days / 7`; days past the last
/// bucket (leap-year day 365) fold into the final one.
pub fn weekly_totals(daily: &[DailyContribution], range_start: NaiveDate) -> [i64; WEEK_BUCKETS] {
    let mut weeks = [0i64; WEEK_BUCKETS];
    for d in daily {
        let offset = (d.date - range_start).num_days();
        if offset < 0 {
            continue;
        }
        let bucket = ((offset / 7) as usize).min(WEEK_BUCKETS - 1);
        weeks[bucket] += d.count;
    }
    weeks
}

/// Calendar-year range: Jan 1 through Dec 31 inclusive.
///
/// Returns `None` for years chrono cannot represent.
pub fn year_range(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
    Some((start, end))
}
