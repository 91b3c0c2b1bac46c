//! Editor-facing TRIGGERcmd endpoints
//!
//! - `GET /triggercmd/{config_id}/commandList`: canonical catalog for dropdowns
//! - `POST /triggercmd/test`: credential probe for the setup dialog

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use super::{ApiState, auth::require_api_key};
use crate::Error;

/// Body of a connection test
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionRequest {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Canonical catalog for a configuration identity
async fn command_list(
    State(state): State<Arc<ApiState>>,
    Path(config_id): Path<String>,
) -> Response {
    match state.catalog.command_list(&config_id).await {
        Ok(catalog) => Json(catalog).into_response(),
        Err(e) => {
            tracing::warn!(config_id = %config_id, error = %e, kind = e.kind(), "command list request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Status for a connection-test response
///
/// Mirrors the remote status, except statuses that are invalid or cannot
/// carry the JSON report (1xx, 204, 304) become 502.
fn report_status(remote: u16) -> StatusCode {
    StatusCode::from_u16(remote)
        .ok()
        .filter(|status| {
            !status.is_informational()
                && *status != StatusCode::NO_CONTENT
                && *status != StatusCode::NOT_MODIFIED
        })
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

/// Probe credentials without touching stored configuration
///
/// A body that is missing or not JSON is treated as having no token.
async fn test_connection(State(state): State<Arc<ApiState>>, body: Bytes) -> Response {
    let req: TestConnectionRequest = serde_json::from_slice(&body).unwrap_or_default();

    match state
        .client
        .probe(req.base_url.as_deref(), req.token.as_deref())
        .await
    {
        Ok(report) => (report_status(report.status), Json(report)).into_response(),
        Err(Error::MissingToken) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": Error::MissingToken.to_string() })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "connection test failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// Build the TRIGGERcmd admin router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/{config_id}/commandList", get(command_list))
        .route("/test", post(test_connection))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .with_state(state)
}
