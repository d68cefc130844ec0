// crates/github/src/rest.rs
//! Unauthenticated REST fetch path: public push events only.
//!
//! This path cannot see pull requests, reviews, issues, languages,
//! organizations or private repositories. Those fields are reported as
//! zero/empty in the resulting `RawActivity` so the normalizer consumes the
//! same shape either way.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use yearbook_core::{DailyContribution, RawActivity, RepoContribution};

use crate::{GithubClient, UpstreamError, UpstreamResult};

/// Events page size for a full fetch (GitHub caps public event history).
const EVENTS_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct PublicEvent {
    #[serde(rename = "type")]
    kind: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    repo: Option<EventRepo>,
    #[serde(default)]
    payload: EventPayload,
}

#[derive(Debug, Deserialize)]
struct EventRepo {
    /// "owner/name" form.
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    /// Commit count of a push event.
    #[serde(default)]
    size: i64,
}

async fn get_events(
    client: &GithubClient,
    subject: &str,
    per_page: u32,
    timeout: std::time::Duration,
) -> UpstreamResult<Vec<PublicEvent>> {
    let url = format!(
        "{}/users/{}/events/public?per_page={}",
        client.rest_base(),
        subject,
        per_page
    );

    let response = client
        .http()
        .get(&url)
        .timeout(timeout)
        .send()
        .await
        .map_err(UpstreamError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::from_status(status, subject));
    }

    response.json().await.map_err(UpstreamError::from_reqwest)
}

pub(crate) async fn fetch_activity(
    client: &GithubClient,
    subject: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> UpstreamResult<RawActivity> {
    let events = get_events(client, subject, EVENTS_PAGE_SIZE, client.fetch_timeout()).await?;

    let mut daily: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    // Per-repo counts keep first-seen order so the normalizer's stable
    // ranking has a deterministic tie order.
    let mut repo_order: Vec<String> = Vec::new();
    let mut repo_counts: BTreeMap<String, i64> = BTreeMap::new();

    for event in &events {
        if event.kind != "PushEvent" {
            continue;
        }
        let day = event.created_at.date_naive();
        if day < start || day > end {
            continue;
        }
        let Some(repo) = &event.repo else {
            continue;
        };
        let name = repo
            .name
            .rsplit_once('/')
            .map(|(_, n)| n.to_string())
            .unwrap_or_else(|| repo.name.clone());

        *daily.entry(day).or_insert(0) += event.payload.size;
        if !repo_counts.contains_key(&name) {
            repo_order.push(name.clone());
        }
        *repo_counts.entry(name).or_insert(0) += event.payload.size;
    }

    let total_commits: i64 = daily.values().sum();
    tracing::debug!(
        subject,
        events = events.len(),
        commits = total_commits,
        "aggregated public push events"
    );

    let daily_contributions: Vec<DailyContribution> = daily
        .into_iter()
        .map(|(date, count)| DailyContribution::new(date, count))
        .collect();

    let repo_contributions: Vec<RepoContribution> = repo_order
        .into_iter()
        .map(|name| {
            let count = repo_counts[&name];
            RepoContribution {
                name,
                full_name: None,
                count,
                is_private: false,
                stars: 0,
                forks: 0,
                language: None,
                description: None,
                url: None,
            }
        })
        .collect();

    Ok(RawActivity {
        subject: subject.to_string(),
        total_contributions: total_commits,
        total_commits,
        daily_contributions,
        repo_contributions,
        ..Default::default()
    })
}

pub(crate) async fn probe_latest_event(
    client: &GithubClient,
    subject: &str,
) -> UpstreamResult<Option<DateTime<Utc>>> {
    let events = get_events(client, subject, 1, client.probe_timeout()).await?;
    Ok(events.first().map(|e| e.created_at))
}
