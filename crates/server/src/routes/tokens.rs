// crates/server/src/routes/tokens.rs
//! Stored GitHub token endpoints.
//!
//! The raw token never leaves the server after storage; reads return
//! a masked form only.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveTokenRequest {
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scopes: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatusResponse {
    pub username: String,
    pub masked_token: String,
    pub token_type: Option<String>,
    pub scopes: Option<String>,
    pub is_valid: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteTokenResponse {
    pub deleted: bool,
}

/// POST /api/token - Store (or replace) a token for a username.
pub async fn save_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveTokenRequest>,
) -> ApiResult<Json<TokenStatusResponse>> {
    if req.username.is_empty() || req.token.is_empty() {
        return Err(ApiError::BadRequest(
            "username and token are required".to_string(),
        ));
    }

    state
        .db
        .save_token(
            &req.username,
            &req.token,
            req.token_type.as_deref(),
            req.scopes.as_deref(),
        )
        .await?;

    // Re-read so the response reflects exactly what was stored.
    let stored = state
        .db
        .get_token(&req.username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("token for {}", req.username)))?;

    Ok(Json(TokenStatusResponse {
        masked_token: stored.masked(),
        username: stored.username,
        token_type: stored.token_type,
        scopes: stored.scopes,
        is_valid: stored.is_valid,
    }))
}

/// GET /api/token/{username} - Stored token status, masked.
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> ApiResult<Json<TokenStatusResponse>> {
    let stored = state
        .db
        .get_token(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("token for {username}")))?;

    Ok(Json(TokenStatusResponse {
        masked_token: stored.masked(),
        username: stored.username,
        token_type: stored.token_type,
        scopes: stored.scopes,
        is_valid: stored.is_valid,
    }))
}

/// DELETE /api/token/{username} - Delete a stored token.
pub async fn delete_token(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> ApiResult<Json<DeleteTokenResponse>> {
    state.db.delete_token(&username).await?;
    Ok(Json(DeleteTokenResponse { deleted: true }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/token", post(save_token))
        .route("/token/{username}", get(get_token))
        .route("/token/{username}", delete(delete_token))
}
