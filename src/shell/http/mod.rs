//! Axum-based HTTP shell: JSON API under `/api/` plus a single-page chat UI.
//!
//! Implements [`Component`] so it runs alongside the console shell:
//! `run()` drives the axum event loop and the shared [`CancellationToken`]
//! is wired to axum's graceful shutdown.
//!
//! ## URL layout
//!
//! ```text
//! GET  /api/health           model runtime reachability
//! GET  /api/models           model registry
//! GET  /api/personas         prompt catalog
//! GET  /api/conversation     session id, settings, transcript
//! POST /api/message          run one turn
//! POST /api/clear            clear transcript, new session id
//! GET  /api/settings
//! PUT  /api/settings         partial update
//! GET  /favicon.ico        → 204
//! GET  /                   → chat page
//! ```

mod api;
mod ui;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Theme;
use crate::error::AppError;
use crate::llm::LlmProvider;

use super::{Component, ComponentFuture, SharedSession};

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone: all fields are reference-counted or `Copy`.
#[derive(Clone)]
pub struct HttpState {
    /// Shell identifier used in log fields.
    pub shell_id: Arc<str>,
    pub app_name: Arc<str>,
    pub theme: Theme,
    pub session: SharedSession,
    /// Separate handle for health probes, so they never wait on a turn.
    pub provider: LlmProvider,
}

// ── HttpShell ─────────────────────────────────────────────────────────────────

pub struct HttpShell {
    bind_addr: String,
    state: HttpState,
}

impl HttpShell {
    pub fn new(
        shell_id: impl Into<String>,
        bind_addr: impl Into<String>,
        theme: Theme,
        app_name: impl Into<String>,
        session: SharedSession,
        provider: LlmProvider,
    ) -> Self {
        let state = HttpState {
            shell_id: Arc::from(shell_id.into()),
            app_name: Arc::from(app_name.into()),
            theme,
            session,
            provider,
        };
        Self { bind_addr: bind_addr.into(), state }
    }
}

impl Component for HttpShell {
    fn id(&self) -> &str {
        &self.state.shell_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_http(self.bind_addr, self.state, shutdown))
    }
}

// ── Server loop ───────────────────────────────────────────────────────────────

async fn run_http(bind_addr: String, state: HttpState, shutdown: CancellationToken) -> Result<(), AppError> {
    let shell_id = state.shell_id.clone();
    let router = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Shell(format!("http bind failed on {bind_addr}: {e}")))?;

    info!(%shell_id, %bind_addr, "http shell listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Shell(format!("http server error: {e}")))?;

    info!(%shell_id, "http shell shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/health",       get(api::health))
        .route("/api/models",       get(api::models))
        .route("/api/personas",     get(api::personas))
        .route("/api/conversation", get(api::conversation))
        .route("/api/message",      post(api::message))
        .route("/api/clear",        post(api::clear))
        .route("/api/settings",     get(api::settings).put(api::update_settings))
        .route("/favicon.ico",      get(|| async { StatusCode::NO_CONTENT }))
        .route("/",                 get(ui::root))
        .with_state(state)
}
