//! Axum handlers for `/api/*` routes.
//!
//! Every handler receives [`HttpState`] via [`axum::extract::State`]. Chat
//! turns hold the session lock for their full duration, so concurrent
//! `POST /api/message` calls are answered strictly one after another. Each
//! turn runs on its own task and completes even if the client disconnects.

use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

use crate::catalog::{ModelRegistry, Persona};
use crate::session::SettingsPatch;

use super::HttpState;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(6);

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct MessageRequest {
    message: String,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/health
pub(super) async fn health(State(state): State<HttpState>) -> Response {
    let provider = state.provider.name();
    match tokio::time::timeout(HEALTH_TIMEOUT, state.provider.ping()).await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "provider": provider })),
        )
            .into_response(),
        Ok(Err(e)) => {
            warn!(shell_id = %state.shell_id, "runtime health probe failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unreachable", "provider": provider, "message": e.to_string() })),
            )
                .into_response()
        }
        Err(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            json_error("timeout", "runtime health probe timed out"),
        )
            .into_response(),
    }
}

/// GET /api/models
pub(super) async fn models() -> Response {
    Json(json!({ "models": ModelRegistry::all() })).into_response()
}

/// GET /api/personas
pub(super) async fn personas() -> Response {
    let personas: Vec<_> = Persona::ALL
        .iter()
        .map(|p| json!({ "name": p.name(), "instruction": p.instruction() }))
        .collect();
    Json(json!({ "personas": personas })).into_response()
}

/// GET /api/conversation
pub(super) async fn conversation(State(state): State<HttpState>) -> Response {
    let s = state.session.lock().await;
    Json(json!({
        "session_id": s.session_id(),
        "settings": s.settings(),
        "turns": s.transcript(),
    }))
    .into_response()
}

/// POST /api/message: one full chat turn.
///
/// Runtime failures still answer `200`: the error text is the assistant's
/// reply and `failed` is set.
pub(super) async fn message(State(state): State<HttpState>, Json(req): Json<MessageRequest>) -> Response {
    if req.message.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, json_error("empty_message", "message must not be empty"))
            .into_response();
    }

    debug!(shell_id = %state.shell_id, len = req.message.len(), "http message received");
    let session = state.session.clone();
    let turn = tokio::spawn(async move { session.lock().await.submit(&req.message).await });

    match turn.await {
        Ok(Some(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(None) => (StatusCode::BAD_REQUEST, json_error("empty_message", "message must not be empty"))
            .into_response(),
        Err(e) => {
            error!(shell_id = %state.shell_id, "chat turn task failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, json_error("turn_failed", e)).into_response()
        }
    }
}

/// POST /api/clear
pub(super) async fn clear(State(state): State<HttpState>) -> Response {
    let session_id = state.session.lock().await.clear();
    Json(json!({ "session_id": session_id })).into_response()
}

/// GET /api/settings
pub(super) async fn settings(State(state): State<HttpState>) -> Response {
    let s = state.session.lock().await;
    Json(s.settings()).into_response()
}

/// PUT /api/settings: partial update; all-or-nothing.
pub(super) async fn update_settings(
    State(state): State<HttpState>,
    Json(patch): Json<SettingsPatch>,
) -> Response {
    let mut s = state.session.lock().await;
    match s.update_settings(&patch) {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => {
            debug!(shell_id = %state.shell_id, "rejected settings update: {e}");
            (StatusCode::UNPROCESSABLE_ENTITY, json_error("invalid_settings", e)).into_response()
        }
    }
}
