// Integration tests for the (subject, year) stats cache: store, replace,
// invalidate, and persistence across handles on a file-backed database.

use chrono::{NaiveDate, TimeZone, Utc};
use pretty_assertions::assert_eq;
use yearbook_core::{ContributionRecord, DailyContribution, LanguageStat, RepoContribution};
use yearbook_db::Database;

fn record(subject: &str, year: i32, total: i64) -> ContributionRecord {
    ContributionRecord {
        subject: subject.to_string(),
        year,
        avatar_url: Some("https://avatars.example/octocat".to_string()),
        bio: None,
        company: Some("GitHub".to_string()),
        location: None,
        followers: 4000,
        following: 9,
        total_contributions: total,
        total_commits: total,
        pull_requests: 2,
        pull_request_reviews: 1,
        issues: 0,
        longest_streak: 3,
        current_streak: 1,
        active_days: 1,
        repo_count: 1,
        public_repo_count: 8,
        private_repo_count: 0,
        total_repo_count: 8,
        daily_contributions: vec![DailyContribution::new(
            NaiveDate::from_ymd_opt(year, 1, 2).unwrap(),
            total,
        )],
        language_stats: vec![LanguageStat {
            name: "Rust".to_string(),
            color: "#dea584".to_string(),
            size: 100,
            repo_count: 1,
            percentage: 100.0,
        }],
        top_repos: vec![RepoContribution {
            name: "hello-world".to_string(),
            full_name: Some("octocat/hello-world".to_string()),
            count: total,
            is_private: false,
            stars: 12,
            forks: 3,
            language: Some("Rust".to_string()),
            description: None,
            url: None,
        }],
        organizations: vec![],
        updated_at: Utc.with_ymd_and_hms(year, 6, 1, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let db = Database::new_in_memory().await.unwrap();

    let rec = record("octocat", 2024, 42);
    db.put_record(&rec).await.unwrap();

    let fetched = db.get_record("octocat", 2024).await.unwrap().unwrap();
    assert_eq!(fetched, rec);
}

#[tokio::test]
async fn test_get_missing_returns_none() {
    let db = Database::new_in_memory().await.unwrap();
    assert!(db.get_record("octocat", 2024).await.unwrap().is_none());
}

#[tokio::test]
async fn test_keys_are_independent() {
    let db = Database::new_in_memory().await.unwrap();

    db.put_record(&record("octocat", 2023, 10)).await.unwrap();
    db.put_record(&record("octocat", 2024, 20)).await.unwrap();
    db.put_record(&record("hubot", 2024, 30)).await.unwrap();

    let a = db.get_record("octocat", 2023).await.unwrap().unwrap();
    let b = db.get_record("octocat", 2024).await.unwrap().unwrap();
    let c = db.get_record("hubot", 2024).await.unwrap().unwrap();
    assert_eq!(a.total_contributions, 10);
    assert_eq!(b.total_contributions, 20);
    assert_eq!(c.total_contributions, 30);
}

#[tokio::test]
async fn test_put_replaces_existing_row() {
    let db = Database::new_in_memory().await.unwrap();

    db.put_record(&record("octocat", 2024, 10)).await.unwrap();
    db.put_record(&record("octocat", 2024, 99)).await.unwrap();

    let fetched = db.get_record("octocat", 2024).await.unwrap().unwrap();
    assert_eq!(fetched.total_contributions, 99);
}

#[tokio::test]
async fn test_concurrent_puts_for_same_key_last_write_wins() {
    let db = Database::new_in_memory().await.unwrap();

    // Two writers racing on the same key, as when two requests miss the
    // cache simultaneously and both fetch. Neither put may fail.
    let a = record("octocat", 2024, 111);
    let b = record("octocat", 2024, 222);
    let writer_a = db.clone();
    let writer_b = db.clone();
    let (res_a, res_b) = tokio::join!(writer_a.put_record(&a), writer_b.put_record(&b));
    res_a.unwrap();
    res_b.unwrap();

    // The surviving row is exactly one of the two, never a mix.
    let stored = db.get_record("octocat", 2024).await.unwrap().unwrap();
    assert!(stored == a || stored == b);
}

#[tokio::test]
async fn test_invalidate_removes_only_that_key() {
    let db = Database::new_in_memory().await.unwrap();

    db.put_record(&record("octocat", 2023, 10)).await.unwrap();
    db.put_record(&record("octocat", 2024, 20)).await.unwrap();

    db.invalidate_record("octocat", 2024).await.unwrap();

    assert!(db.get_record("octocat", 2024).await.unwrap().is_none());
    assert!(db.get_record("octocat", 2023).await.unwrap().is_some());

    // Invalidating an absent key is a no-op.
    db.invalidate_record("octocat", 2024).await.unwrap();
}

#[tokio::test]
async fn test_records_persist_across_handles() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("yearbook.db");

    {
        let db = Database::new(&path).await.unwrap();
        db.put_record(&record("octocat", 2024, 7)).await.unwrap();
    }

    let db = Database::new(&path).await.unwrap();
    let fetched = db.get_record("octocat", 2024).await.unwrap().unwrap();
    assert_eq!(fetched.total_contributions, 7);
}
