// crates/github/src/graphql.rs
//! Authenticated GraphQL fetch path and the pushed-at staleness probe.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use yearbook_core::{
    DailyContribution, LanguageStat, Organization, RawActivity, RepoContribution,
};

use crate::{GithubClient, UpstreamError, UpstreamResult};

/// Fallback swatch for languages GitHub reports without a color.
const DEFAULT_LANGUAGE_COLOR: &str = "#8b949e";

/// Rich activity query: profile, repositories (owned + collaborator +
/// org-member, most recently pushed first), contribution calendar for the
/// exact range, per-repo commit contributions and language byte sizes.
const ACTIVITY_QUERY: &str = r#"
query($from: DateTime!, $to: DateTime!) {
    viewer {
        login
        avatarUrl
        bio
        company
        location
        followers { totalCount }
        following { totalCount }
        repositories(first: 100, ownerAffiliations: [OWNER, COLLABORATOR, ORGANIZATION_MEMBER], orderBy: {field: PUSHED_AT, direction: DESC}) {
            totalCount
            nodes {
                name
                nameWithOwner
                isPrivate
                stargazerCount
                forkCount
                description
                url
                primaryLanguage { name color }
                languages(first: 10, orderBy: {field: SIZE, direction: DESC}) {
                    edges { size node { name color } }
                }
            }
        }
        contributionsCollection(from: $from, to: $to) {
            totalCommitContributions
            totalPullRequestContributions
            totalPullRequestReviewContributions
            totalIssueContributions
            contributionCalendar {
                totalContributions
                weeks {
                    contributionDays { date contributionCount }
                }
            }
            commitContributionsByRepository(maxRepositories: 100) {
                repository {
                    name
                    nameWithOwner
                    isPrivate
                    stargazerCount
                    forkCount
                    description
                    url
                    primaryLanguage { name color }
                }
                contributions { totalCount }
            }
        }
        organizations(first: 100) {
            nodes { login avatarUrl }
        }
    }
}
"#;

/// Single-repo probe: the most recently pushed repository's push time.
const PROBE_QUERY: &str = r#"
query {
    viewer {
        repositories(first: 1, orderBy: {field: PUSHED_AT, direction: DESC}) {
            nodes { pushedAt }
        }
    }
}
"#;

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityData {
    viewer: Viewer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Viewer {
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    followers: CountNode,
    #[serde(default)]
    following: CountNode,
    repositories: RepositoryConnection,
    contributions_collection: ContributionsCollection,
    #[serde(default)]
    organizations: OrganizationConnection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CountNode {
    #[serde(default)]
    total_count: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryConnection {
    #[serde(default)]
    total_count: i64,
    #[serde(default)]
    nodes: Option<Vec<Option<RepositoryNode>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    name: String,
    #[serde(default)]
    name_with_owner: Option<String>,
    #[serde(default)]
    is_private: bool,
    #[serde(default)]
    stargazer_count: i64,
    #[serde(default)]
    fork_count: i64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    primary_language: Option<LanguageNode>,
    #[serde(default)]
    languages: Option<LanguageConnection>,
}

#[derive(Debug, Deserialize)]
struct LanguageNode {
    name: String,
    #[serde(default)]
    color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LanguageConnection {
    #[serde(default)]
    edges: Option<Vec<Option<LanguageEdge>>>,
}

#[derive(Debug, Deserialize)]
struct LanguageEdge {
    size: i64,
    node: LanguageNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    #[serde(default)]
    total_commit_contributions: i64,
    #[serde(default)]
    total_pull_request_contributions: i64,
    #[serde(default)]
    total_pull_request_review_contributions: i64,
    #[serde(default)]
    total_issue_contributions: i64,
    contribution_calendar: ContributionCalendar,
    #[serde(default)]
    commit_contributions_by_repository: Vec<CommitContributions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionCalendar {
    #[serde(default)]
    total_contributions: i64,
    #[serde(default)]
    weeks: Vec<CalendarWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    #[serde(default)]
    contribution_days: Vec<CalendarDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    date: NaiveDate,
    contribution_count: i64,
}

#[derive(Debug, Deserialize)]
struct CommitContributions {
    repository: RepositoryNode,
    #[serde(default)]
    contributions: CountNode,
}

#[derive(Debug, Default, Deserialize)]
struct OrganizationConnection {
    #[serde(default)]
    nodes: Option<Vec<Option<OrganizationNode>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizationNode {
    login: String,
    avatar_url: String,
}

#[derive(Debug, Deserialize)]
struct ProbeData {
    viewer: ProbeViewer,
}

#[derive(Debug, Deserialize)]
struct ProbeViewer {
    repositories: ProbeRepositories,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeRepositories {
    #[serde(default)]
    nodes: Option<Vec<Option<ProbeRepo>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProbeRepo {
    #[serde(default)]
    pushed_at: Option<DateTime<Utc>>,
}

// ── Requests ────────────────────────────────────────────────────────────

async fn post_query<T: serde::de::DeserializeOwned>(
    client: &GithubClient,
    token: &str,
    subject: &str,
    body: serde_json::Value,
    timeout: std::time::Duration,
) -> UpstreamResult<T> {
    let response = client
        .http()
        .post(client.graphql_url())
        .bearer_auth(token)
        .header("Content-Type", "application/json")
        .json(&body)
        .timeout(timeout)
        .send()
        .await
        .map_err(UpstreamError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::from_status(status, subject));
    }

    let parsed: GraphqlResponse<T> = response
        .json()
        .await
        .map_err(UpstreamError::from_reqwest)?;

    if let Some(err) = parsed.errors.first() {
        // A 200 can still carry GraphQL-level errors.
        if err.kind.as_deref() == Some("NOT_FOUND") {
            return Err(UpstreamError::SubjectNotFound(subject.to_string()));
        }
        return Err(UpstreamError::Malformed(err.message.clone()));
    }

    parsed
        .data
        .ok_or_else(|| UpstreamError::Malformed("missing data field".into()))
}

pub(crate) async fn fetch_activity(
    client: &GithubClient,
    subject: &str,
    start: NaiveDate,
    end: NaiveDate,
    token: &str,
) -> UpstreamResult<RawActivity> {
    let body = serde_json::json!({
        "query": ACTIVITY_QUERY,
        "variables": {
            "from": format!("{start}T00:00:00Z"),
            "to": format!("{end}T23:59:59Z"),
        },
    });

    let data: ActivityData =
        post_query(client, token, subject, body, client.fetch_timeout()).await?;
    let raw = into_raw_activity(subject, data.viewer);
    tracing::debug!(
        subject,
        contributions = raw.total_contributions,
        repos = raw.repo_contributions.len(),
        "fetched activity via GraphQL"
    );
    Ok(raw)
}

pub(crate) async fn probe_latest_push(
    client: &GithubClient,
    token: &str,
) -> UpstreamResult<Option<DateTime<Utc>>> {
    let body = serde_json::json!({ "query": PROBE_QUERY });
    let data: ProbeData = post_query(client, token, "", body, client.probe_timeout()).await?;

    let pushed_at = data
        .viewer
        .repositories
        .nodes
        .into_iter()
        .flatten()
        .flatten()
        .next()
        .and_then(|repo| repo.pushed_at);
    Ok(pushed_at)
}

// ── Payload assembly ────────────────────────────────────────────────────

fn into_raw_activity(subject: &str, viewer: Viewer) -> RawActivity {
    let repos: Vec<RepositoryNode> = viewer
        .repositories
        .nodes
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect();

    let public_repos = repos.iter().filter(|r| !r.is_private).count() as i64;
    let private_repos = repos.iter().filter(|r| r.is_private).count() as i64;

    let collection = viewer.contributions_collection;
    let calendar = collection.contribution_calendar;

    let daily_contributions: Vec<DailyContribution> = calendar
        .weeks
        .into_iter()
        .flat_map(|w| w.contribution_days)
        .map(|d| DailyContribution::new(d.date, d.contribution_count))
        .collect();

    let repo_contributions: Vec<RepoContribution> = collection
        .commit_contributions_by_repository
        .into_iter()
        .map(|item| RepoContribution {
            name: item.repository.name,
            full_name: item.repository.name_with_owner,
            count: item.contributions.total_count,
            is_private: item.repository.is_private,
            stars: item.repository.stargazer_count,
            forks: item.repository.fork_count,
            language: item.repository.primary_language.map(|l| l.name),
            description: item.repository.description,
            url: item.repository.url,
        })
        .collect();

    // Accumulate language byte sizes across repositories, preserving first-seen
    // order; the normalizer sorts and computes percentages.
    let mut language_stats: Vec<LanguageStat> = Vec::new();
    let mut language_index: HashMap<String, usize> = HashMap::new();
    for repo in &repos {
        let edges = repo
            .languages
            .as_ref()
            .and_then(|l| l.edges.as_ref())
            .map(|e| e.as_slice())
            .unwrap_or_default();
        for edge in edges.iter().flatten() {
            match language_index.get(&edge.node.name) {
                Some(&i) => {
                    language_stats[i].size += edge.size;
                    language_stats[i].repo_count += 1;
                }
                None => {
                    language_index.insert(edge.node.name.clone(), language_stats.len());
                    language_stats.push(LanguageStat {
                        name: edge.node.name.clone(),
                        color: edge
                            .node
                            .color
                            .clone()
                            .unwrap_or_else(|| DEFAULT_LANGUAGE_COLOR.into()),
                        size: edge.size,
                        repo_count: 1,
                        percentage: 0.0,
                    });
                }
            }
        }
    }

    let organizations: Vec<Organization> = viewer
        .organizations
        .nodes
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(|o| Organization {
            login: o.login,
            avatar_url: o.avatar_url,
        })
        .collect();

    RawActivity {
        subject: subject.to_string(),
        avatar_url: viewer.avatar_url,
        bio: viewer.bio,
        company: viewer.company,
        location: viewer.location,
        followers: viewer.followers.total_count,
        following: viewer.following.total_count,
        public_repos,
        private_repos,
        total_repos: viewer.repositories.total_count,
        total_contributions: calendar.total_contributions,
        total_commits: collection.total_commit_contributions,
        pull_requests: collection.total_pull_request_contributions,
        pull_request_reviews: collection.total_pull_request_review_contributions,
        issues: collection.total_issue_contributions,
        daily_contributions,
        repo_contributions,
        language_stats,
        organizations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn viewer_fixture() -> serde_json::Value {
        serde_json::json!({
            "data": {
                "viewer": {
                    "login": "octocat",
                    "avatarUrl": "https://example.com/a.png",
                    "bio": "builds things",
                    "company": null,
                    "location": "Internet",
                    "followers": { "totalCount": 42 },
                    "following": { "totalCount": 7 },
                    "repositories": {
                        "totalCount": 3,
                        "nodes": [
                            {
                                "name": "alpha",
                                "nameWithOwner": "octocat/alpha",
                                "isPrivate": false,
                                "stargazerCount": 12,
                                "forkCount": 2,
                                "description": "first",
                                "url": "https://github.com/octocat/alpha",
                                "primaryLanguage": { "name": "Rust", "color": "#dea584" },
                                "languages": {
                                    "edges": [
                                        { "size": 900, "node": { "name": "Rust", "color": "#dea584" } },
                                        { "size": 100, "node": { "name": "Shell", "color": null } }
                                    ]
                                }
                            },
                            {
                                "name": "beta",
                                "nameWithOwner": "octocat/beta",
                                "isPrivate": true,
                                "stargazerCount": 0,
                                "forkCount": 0,
                                "description": null,
                                "url": "https://github.com/octocat/beta",
                                "primaryLanguage": null,
                                "languages": {
                                    "edges": [
                                        { "size": 300, "node": { "name": "Rust", "color": "#dea584" } }
                                    ]
                                }
                            },
                            null
                        ]
                    },
                    "contributionsCollection": {
                        "totalCommitContributions": 120,
                        "totalPullRequestContributions": 8,
                        "totalPullRequestReviewContributions": 3,
                        "totalIssueContributions": 5,
                        "contributionCalendar": {
                            "totalContributions": 140,
                            "weeks": [
                                { "contributionDays": [
                                    { "date": "2024-01-01", "contributionCount": 2 },
                                    { "date": "2024-01-02", "contributionCount": 0 }
                                ]},
                                { "contributionDays": [
                                    { "date": "2024-01-08", "contributionCount": 4 }
                                ]}
                            ]
                        },
                        "commitContributionsByRepository": [
                            {
                                "repository": {
                                    "name": "alpha",
                                    "nameWithOwner": "octocat/alpha",
                                    "isPrivate": false,
                                    "stargazerCount": 12,
                                    "forkCount": 2,
                                    "description": "first",
                                    "url": "https://github.com/octocat/alpha",
                                    "primaryLanguage": { "name": "Rust", "color": "#dea584" }
                                },
                                "contributions": { "totalCount": 90 }
                            },
                            {
                                "repository": {
                                    "name": "beta",
                                    "nameWithOwner": "octocat/beta",
                                    "isPrivate": true,
                                    "stargazerCount": 0,
                                    "forkCount": 0,
                                    "description": null,
                                    "url": "https://github.com/octocat/beta",
                                    "primaryLanguage": null
                                },
                                "contributions": { "totalCount": 30 }
                            }
                        ]
                    },
                    "organizations": {
                        "nodes": [
                            { "login": "acme", "avatarUrl": "https://example.com/acme.png" }
                        ]
                    }
                }
            }
        })
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_fetch_activity_rich_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "Bearer token-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(viewer_fixture().to_string())
            .create_async()
            .await;

        let client =
            GithubClient::with_base_urls(format!("{}/graphql", server.url()), server.url());
        let raw = client
            .fetch_activity("octocat", date("2024-01-01"), date("2024-12-31"), Some("token-1"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(raw.subject, "octocat");
        assert_eq!(raw.followers, 42);
        assert_eq!(raw.public_repos, 1);
        assert_eq!(raw.private_repos, 1);
        assert_eq!(raw.total_repos, 3);
        assert_eq!(raw.total_contributions, 140);
        assert_eq!(raw.pull_requests, 8);

        // Calendar flattened in order.
        assert_eq!(raw.daily_contributions.len(), 3);
        assert_eq!(raw.daily_contributions[2].date, date("2024-01-08"));

        // Rust accumulated across two repos; null color falls back.
        assert_eq!(raw.language_stats.len(), 2);
        assert_eq!(raw.language_stats[0].name, "Rust");
        assert_eq!(raw.language_stats[0].size, 1200);
        assert_eq!(raw.language_stats[0].repo_count, 2);
        assert_eq!(raw.language_stats[1].color, DEFAULT_LANGUAGE_COLOR);

        assert_eq!(raw.repo_contributions.len(), 2);
        assert!(raw.repo_contributions[1].is_private);
        assert_eq!(raw.organizations[0].login, "acme");
    }

    #[tokio::test]
    async fn test_fetch_activity_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(401)
            .with_body("{}")
            .create_async()
            .await;

        let client =
            GithubClient::with_base_urls(format!("{}/graphql", server.url()), server.url());
        let err = client
            .fetch_activity("octocat", date("2024-01-01"), date("2024-12-31"), Some("bad"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Unauthorized));
    }

    #[tokio::test]
    async fn test_fetch_activity_graphql_not_found_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "data": null,
                    "errors": [{ "type": "NOT_FOUND", "message": "Could not resolve to a User" }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            GithubClient::with_base_urls(format!("{}/graphql", server.url()), server.url());
        let err = client
            .fetch_activity("ghost", date("2024-01-01"), date("2024-12-31"), Some("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::SubjectNotFound(s) if s == "ghost"));
    }

    #[tokio::test]
    async fn test_fetch_activity_graphql_generic_error_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "errors": [{ "message": "Something went wrong" }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            GithubClient::with_base_urls(format!("{}/graphql", server.url()), server.url());
        let err = client
            .fetch_activity("octocat", date("2024-01-01"), date("2024-12-31"), Some("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed(m) if m.contains("Something")));
    }

    #[tokio::test]
    async fn test_fetch_activity_server_error_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(502)
            .create_async()
            .await;

        let client =
            GithubClient::with_base_urls(format!("{}/graphql", server.url()), server.url());
        let err = client
            .fetch_activity("octocat", date("2024-01-01"), date("2024-12-31"), Some("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_probe_latest_push() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "data": { "viewer": { "repositories": {
                        "nodes": [{ "pushedAt": "2024-06-01T10:30:00Z" }]
                    }}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            GithubClient::with_base_urls(format!("{}/graphql", server.url()), server.url());
        let probed = client
            .probe_latest_activity("octocat", Some("t"))
            .await
            .unwrap();
        assert_eq!(
            probed.unwrap().to_rfc3339(),
            "2024-06-01T10:30:00+00:00"
        );
    }

    #[tokio::test]
    async fn test_probe_no_repositories_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "data": { "viewer": { "repositories": { "nodes": [] } } }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client =
            GithubClient::with_base_urls(format!("{}/graphql", server.url()), server.url());
        let probed = client
            .probe_latest_activity("octocat", Some("t"))
            .await
            .unwrap();
        assert!(probed.is_none());
    }

    #[test]
    fn test_into_raw_activity_sparse_viewer() {
        // Minimal viewer: no repos, no orgs, empty calendar. Nothing panics,
        // everything defaults.
        let data: ActivityData = serde_json::from_value(
            serde_json::json!({
                "viewer": {
                    "repositories": { "totalCount": 0 },
                    "contributionsCollection": {
                        "contributionCalendar": {}
                    }
                }
            }),
        )
        .unwrap();
        let raw = into_raw_activity("ghost", data.viewer);
        assert_eq!(raw.subject, "ghost");
        assert_eq!(raw.total_commits, 0);
        assert!(raw.daily_contributions.is_empty());
        assert!(raw.language_stats.is_empty());
    }
}
