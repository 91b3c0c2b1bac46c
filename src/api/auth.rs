//! Admin API key guard
//!
//! Editors send the key as `Authorization: Bearer <key>`; scripts may use
//! `X-Api-Key: <key>` instead.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::ApiState;

const API_KEY_HEADER: &str = "x-api-key";

/// Key presented by the caller, bearer header first
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    bearer.or_else(|| headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()))
}

fn unauthorized(reason: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": reason })),
    )
        .into_response()
}

/// Reject admin requests that do not carry the configured key
///
/// Without a configured key every request passes.
pub async fn require_api_key(
    State(state): State<Arc<ApiState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(req).await;
    };

    match presented_key(req.headers()) {
        Some(key) if key == expected => next.run(req).await,
        Some(_) => {
            tracing::warn!(path = %req.uri().path(), "rejected admin request with wrong API key");
            unauthorized("invalid API key")
        }
        None => {
            tracing::debug!(path = %req.uri().path(), "admin request without API key");
            unauthorized("API key required")
        }
    }
}
