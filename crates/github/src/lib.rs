// crates/github/src/lib.rs
//! Upstream client for GitHub contribution data.
//!
//! Two fetch paths produce the same [`RawActivity`] shape:
//! - authenticated (GraphQL): profile, repositories, contribution calendar,
//!   per-repo commit counts, language byte sizes, organizations;
//! - unauthenticated (REST): public push events only, with everything the
//!   restricted API cannot see reported as zero/empty.
//!
//! A third call, [`GithubClient::probe_latest_activity`], is the cheap
//! staleness probe the orchestrator compares against a cached record's
//! `updated_at`. Nothing here retries: every failure surfaces as a typed
//! [`UpstreamError`] for the caller to act on.

mod graphql;
mod rest;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use yearbook_core::RawActivity;

/// Full-payload fetch bound.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Staleness-probe bound; a probe must stay cheap.
const PROBE_TIMEOUT: Duration = Duration::from_secs(8);

const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const DEFAULT_REST_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("gh-yearbook/", env!("CARGO_PKG_VERSION"));

/// Upstream failure taxonomy. Variants map 1:1 to user-visible reasons so
/// the HTTP layer can pick a status code without string matching.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("GitHub rejected the credential")]
    Unauthorized,

    #[error("GitHub user not found: {0}")]
    SubjectNotFound(String),

    #[error("GitHub unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected GitHub response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    fn from_status(status: StatusCode, subject: &str) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => UpstreamError::Unauthorized,
            StatusCode::NOT_FOUND => UpstreamError::SubjectNotFound(subject.to_string()),
            s => UpstreamError::Unavailable(format!("HTTP {s}")),
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Malformed(err.to_string())
        } else {
            // Timeouts, connect failures and everything transport-shaped.
            UpstreamError::Unavailable(err.to_string())
        }
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// GitHub API client. Cheap to clone; base URLs are injectable for tests.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    graphql_url: String,
    rest_base: String,
}

impl Default for GithubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubClient {
    pub fn new() -> Self {
        Self::with_base_urls(DEFAULT_GRAPHQL_URL, DEFAULT_REST_BASE)
    }

    /// Client pointing at alternative endpoints (mock servers in tests).
    pub fn with_base_urls(graphql_url: impl Into<String>, rest_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            graphql_url: graphql_url.into(),
            rest_base: rest_base.into(),
        }
    }

    /// Fetch raw activity for `subject` over `[start, end]` inclusive.
    ///
    /// Credential presence selects the rich GraphQL path; without one only
    /// public push events are visible.
    pub async fn fetch_activity(
        &self,
        subject: &str,
        start: NaiveDate,
        end: NaiveDate,
        credential: Option<&str>,
    ) -> UpstreamResult<RawActivity> {
        match credential {
            Some(token) => graphql::fetch_activity(self, subject, start, end, token).await,
            None => rest::fetch_activity(self, subject, start, end).await,
        }
    }

    /// Cheapest possible "has the subject pushed since T?" signal.
    ///
    /// `Ok(None)` means no signal is obtainable (no repos, no public
    /// events); the caller treats that as "assume fresh", not as an error.
    pub async fn probe_latest_activity(
        &self,
        subject: &str,
        credential: Option<&str>,
    ) -> UpstreamResult<Option<DateTime<Utc>>> {
        match credential {
            Some(token) => graphql::probe_latest_push(self, token).await,
            None => rest::probe_latest_event(self, subject).await,
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    pub(crate) fn rest_base(&self) -> &str {
        &self.rest_base
    }

    pub(crate) fn fetch_timeout(&self) -> Duration {
        FETCH_TIMEOUT
    }

    pub(crate) fn probe_timeout(&self) -> Duration {
        PROBE_TIMEOUT
    }
}
