// crates/db/src/stats.rs
//! Contribution record cache: get / put / invalidate keyed by
//! (subject, year).
//!
//! `put_record` is an atomic upsert. Two concurrent refreshes for the same
//! key may both fetch and both put; the ON CONFLICT clause makes the last
//! write win without either corrupting the row, so correctness never
//! depends on external locking.

use chrono::{DateTime, Utc};
use sqlx::Row;

use yearbook_core::{
    ContributionRecord, DailyContribution, LanguageStat, Organization, RepoContribution,
};

use crate::{Database, DbError, DbResult};

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ContributionRecord, DbError> {
    let daily: Vec<DailyContribution> =
        serde_json::from_str(row.try_get::<&str, _>("daily_contributions")?)?;
    let languages: Vec<LanguageStat> =
        serde_json::from_str(row.try_get::<&str, _>("language_stats")?)?;
    let top_repos: Vec<RepoContribution> =
        serde_json::from_str(row.try_get::<&str, _>("top_repos")?)?;
    let organizations: Vec<Organization> =
        serde_json::from_str(row.try_get::<&str, _>("organizations")?)?;

    let updated_at = DateTime::<Utc>::from_timestamp(row.try_get("updated_at")?, 0)
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH);

    Ok(ContributionRecord {
        subject: row.try_get("subject")?,
        year: row.try_get("year")?,
        avatar_url: row.try_get("avatar_url")?,
        bio: row.try_get("bio")?,
        company: row.try_get("company")?,
        location: row.try_get("location")?,
        followers: row.try_get("followers")?,
        following: row.try_get("following")?,
        total_contributions: row.try_get("total_contributions")?,
        total_commits: row.try_get("total_commits")?,
        pull_requests: row.try_get("pull_requests")?,
        pull_request_reviews: row.try_get("pull_request_reviews")?,
        issues: row.try_get("issues")?,
        longest_streak: row.try_get("longest_streak")?,
        current_streak: row.try_get("current_streak")?,
        active_days: row.try_get("active_days")?,
        repo_count: row.try_get("repo_count")?,
        public_repo_count: row.try_get("public_repo_count")?,
        private_repo_count: row.try_get("private_repo_count")?,
        total_repo_count: row.try_get("total_repo_count")?,
        daily_contributions: daily,
        language_stats: languages,
        top_repos,
        organizations,
        updated_at,
    })
}

impl Database {
    /// Look up the cached record for (subject, year).
    pub async fn get_record(
        &self,
        subject: &str,
        year: i32,
    ) -> DbResult<Option<ContributionRecord>> {
        let row = sqlx::query("SELECT * FROM contribution_records WHERE subject = ? AND year = ?")
            .bind(subject)
            .bind(year)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// Replace-or-insert the record for its (subject, year) key.
    pub async fn put_record(&self, record: &ContributionRecord) -> DbResult<()> {
        let daily = serde_json::to_string(&record.daily_contributions)?;
        let languages = serde_json::to_string(&record.language_stats)?;
        let top_repos = serde_json::to_string(&record.top_repos)?;
        let organizations = serde_json::to_string(&record.organizations)?;

        sqlx::query(
            r#"INSERT INTO contribution_records (
                subject, year, avatar_url, bio, company, location,
                followers, following,
                total_contributions, total_commits, pull_requests,
                pull_request_reviews, issues,
                longest_streak, current_streak, active_days,
                repo_count, public_repo_count, private_repo_count, total_repo_count,
                daily_contributions, language_stats, top_repos, organizations,
                updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(subject, year) DO UPDATE SET
                avatar_url = excluded.avatar_url,
                bio = excluded.bio,
                company = excluded.company,
                location = excluded.location,
                followers = excluded.followers,
                following = excluded.following,
                total_contributions = excluded.total_contributions,
                total_commits = excluded.total_commits,
                pull_requests = excluded.pull_requests,
                pull_request_reviews = excluded.pull_request_reviews,
                issues = excluded.issues,
                longest_streak = excluded.longest_streak,
                current_streak = excluded.current_streak,
                active_days = excluded.active_days,
                repo_count = excluded.repo_count,
                public_repo_count = excluded.public_repo_count,
                private_repo_count = excluded.private_repo_count,
                total_repo_count = excluded.total_repo_count,
                daily_contributions = excluded.daily_contributions,
                language_stats = excluded.language_stats,
                top_repos = excluded.top_repos,
                organizations = excluded.organizations,
                updated_at = excluded.updated_at"#,
        )
        .bind(&record.subject)
        .bind(record.year)
        .bind(&record.avatar_url)
        .bind(&record.bio)
        .bind(&record.company)
        .bind(&record.location)
        .bind(record.followers)
        .bind(record.following)
        .bind(record.total_contributions)
        .bind(record.total_commits)
        .bind(record.pull_requests)
        .bind(record.pull_request_reviews)
        .bind(record.issues)
        .bind(record.longest_streak)
        .bind(record.current_streak)
        .bind(record.active_days)
        .bind(record.repo_count)
        .bind(record.public_repo_count)
        .bind(record.private_repo_count)
        .bind(record.total_repo_count)
        .bind(daily)
        .bind(languages)
        .bind(top_repos)
        .bind(organizations)
        .bind(record.updated_at.timestamp())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Delete the cached record for (subject, year). Deleting an absent key
    /// is a no-op.
    pub async fn invalidate_record(&self, subject: &str, year: i32) -> DbResult<()> {
        sqlx::query("DELETE FROM contribution_records WHERE subject = ? AND year = ?")
            .bind(subject)
            .bind(year)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
