// crates/server/src/routes/card.rs
//! Embeddable SVG stats card endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use crate::card::render_card;
use crate::error::ApiResult;
use crate::routes::stats::resolve_credential;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CardQuery {
    pub token: Option<String>,
}

/// GET /api/card/{subject}/{year} - SVG stats card.
///
/// Served with a short cache lifetime so embedding READMEs pick up new
/// contributions without hammering the pipeline.
pub async fn get_card(
    State(state): State<Arc<AppState>>,
    Path((subject, year)): Path<(String, i32)>,
    Query(query): Query<CardQuery>,
) -> ApiResult<Response> {
    let credential = resolve_credential(&state, &subject, query.token).await?;

    let outcome = state
        .stats
        .stats_for_year(&subject, year, credential.as_deref(), false)
        .await?;
    let svg = render_card(&outcome.record);

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        svg,
    )
        .into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/card/{subject}/{year}", get(get_card))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use yearbook_db::Database;
    use yearbook_github::GithubClient;

    #[tokio::test]
    async fn test_card_endpoint_returns_svg() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/octocat/events/public?per_page=100")
            .with_body(
                r#"[{"type": "PushEvent", "created_at": "2024-03-01T12:00:00Z",
                    "repo": {"name": "octocat/hello-world"}, "payload": {"size": 3}}]"#,
            )
            .create_async()
            .await;

        let db = Database::new_in_memory().await.expect("in-memory DB");
        let github =
            GithubClient::with_base_urls(format!("{}/graphql", server.url()), server.url());
        let app = crate::create_app(db, github);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/card/octocat/2024")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "image/svg+xml; charset=utf-8"
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let svg = String::from_utf8(body.to_vec()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("octocat"));
    }
}
