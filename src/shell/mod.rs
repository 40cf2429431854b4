//! Presentation shells: the I/O surfaces around a [`ChatSession`].
//!
//! # Component model
//!
//! Each shell (console, HTTP…) implements [`Component`] and is spawned as an
//! independent task by [`start`]. Shells capture the [`SharedSession`] at
//! construction time; the generic `Component::run` signature only carries the
//! shutdown token.
//!
//! Any shell error cancels the shared [`CancellationToken`] so siblings stop
//! cooperatively. [`start`] returns a [`ShellHandle`] that resolves once all
//! shells have exited.

#[cfg(feature = "channel-axum")]
pub mod http;
#[cfg(feature = "channel-pty")]
pub mod pty;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::llm::LlmProvider;
use crate::session::ChatSession;

/// The one chat session, shared by every running shell.
///
/// Held across a whole turn, so turns from different shells queue up
/// instead of interleaving.
pub type SharedSession = Arc<Mutex<ChatSession>>;

pub fn share(session: ChatSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

// ── Component ─────────────────────────────────────────────────────────────────

/// A boxed, owned future returned by [`Component::run`].
pub type ComponentFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// A self-contained, concurrently-runnable shell.
pub trait Component: Send + 'static {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    /// Consume the component and return its run-loop. Should run until
    /// `shutdown` is cancelled or the shell's own input ends.
    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture;
}

// ── ShellHandle ───────────────────────────────────────────────────────────────

pub struct ShellHandle {
    inner: JoinHandle<Result<(), AppError>>,
}

impl ShellHandle {
    /// Await all shells and return the first error, if any.
    pub async fn join(self) -> Result<(), AppError> {
        match self.inner.await {
            Ok(r) => r,
            Err(e) => Err(AppError::Shell(format!("shell task panicked: {e}"))),
        }
    }
}

// ── start ─────────────────────────────────────────────────────────────────────

/// Build the shells enabled in `config` and spawn them.
///
/// Falls back to the console shell when nothing else is enabled, so the
/// process always has a way to talk to the user.
pub fn start(
    config: &Config,
    session: SharedSession,
    provider: LlmProvider,
    shutdown: CancellationToken,
) -> Result<ShellHandle, AppError> {
    let mut components: Vec<Box<dyn Component>> = Vec::new();

    #[cfg(feature = "channel-axum")]
    if config.shell.http.enabled {
        info!(bind = %config.shell.http.bind, "loading http shell");
        components.push(Box::new(http::HttpShell::new(
            "http0",
            config.shell.http.bind.clone(),
            config.shell.http.theme,
            config.app_name.clone(),
            session.clone(),
            provider.clone(),
        )));
    }

    #[cfg(feature = "channel-pty")]
    if config.shell.pty.enabled || components.is_empty() {
        if !config.shell.pty.enabled {
            warn!("no shell enabled, falling back to console");
        }
        info!("loading pty shell");
        components.push(Box::new(pty::PtyShell::new("pty0", session.clone())));
    }

    if components.is_empty() {
        return Err(AppError::Shell("no shell available in this build".into()));
    }

    Ok(spawn_components(components, shutdown))
}

/// Spawn each [`Component`] as its own task.
///
/// If any component returns `Err` (or panics), `shutdown` is cancelled and
/// the first error is reported once every sibling has stopped. A clean exit
/// leaves the siblings running.
pub fn spawn_components(components: Vec<Box<dyn Component>>, shutdown: CancellationToken) -> ShellHandle {
    let handle = tokio::spawn(async move {
        let mut set: JoinSet<Result<(), AppError>> = JoinSet::new();

        for component in components {
            let id = component.id().to_string();
            debug!(component = %id, "spawning shell");
            set.spawn(component.run(shutdown.clone()));
        }

        let mut first_err: Option<AppError> = None;

        while let Some(res) = set.join_next().await {
            match res {
                Err(e) => {
                    error!("shell panicked: {e}");
                    first_err.get_or_insert_with(|| AppError::Shell(format!("shell panicked: {e}")));
                    shutdown.cancel();
                }
                Ok(Err(e)) => {
                    error!("shell error: {e}");
                    first_err.get_or_insert(e);
                    shutdown.cancel();
                }
                Ok(Ok(())) => debug!("shell exited"),
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    });

    ShellHandle { inner: handle }
}
