//! HTTP handlers: the page, a health probe, and the ask endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::agent::{dispatch, presets};

use super::error::ApiError;
use super::AppState;

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AskData {
    pub content: String,
}

/// GET / - the one-page UI.
pub(crate) async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
pub(crate) async fn health() -> &'static str {
    "ok"
}

/// POST /api/ask
///
/// Empty input never reaches the dispatcher. A non-empty query is
/// dispatched exactly once to a freshly built team; the answer is the
/// transcript's last message content, returned verbatim.
pub(crate) async fn ask(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Value>, ApiError> {
    validate_query(&request.query)?;

    let team = presets::research_team();
    match dispatch(&team, &state.inference, &state.tools, &request.query).await {
        Ok(content) => {
            info!("query answered ({} chars)", content.len());
            Ok(Json(json!({ "ok": true, "data": AskData { content } })))
        }
        Err(err) => {
            warn!("dispatch failed: {:#}", err);
            Err(ApiError::agent_error(format!("{:#}", err)))
        }
    }
}

/// Reject empty or whitespace-only queries before any dispatch happens.
fn validate_query(query: &str) -> Result<(), ApiError> {
    if query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }
    Ok(())
}
