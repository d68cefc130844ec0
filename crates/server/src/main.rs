// crates/server/src/main.rs
//! Yearbook server binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use yearbook_db::Database;
use yearbook_github::GithubClient;
use yearbook_server::create_app;

const DEFAULT_PORT: u16 = 8471;

fn get_port() -> u16 {
    std::env::var("YEARBOOK_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

fn get_db_path() -> PathBuf {
    std::env::var("YEARBOOK_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data/yearbook.db"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db_path = get_db_path();
    let db = Database::new(&db_path).await?;
    let app = create_app(db, GithubClient::new());

    let addr = SocketAddr::from(([0, 0, 0, 0], get_port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("yearbook server listening on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
