//! Model runtime abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities: clone them freely.
//! Each call is a single round-trip: one [`Invocation`] in, one text reply
//! (or one [`ProviderError`]) out. No retries happen at this layer.

pub mod providers;

use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

/// Anything that can go wrong talking to the model runtime.
///
/// `Display` yields the bare runtime message; the generation service adds the
/// `Error: ` prefix when folding it into the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    /// Transport-level failure: connection refused, DNS, timeout.
    #[error("{0}")]
    Unreachable(String),
    #[error("model '{0}' not found")]
    ModelNotFound(String),
    /// The runtime answered, but not with a usable reply.
    #[error("{0}")]
    Request(String),
}

// ── Invocation ────────────────────────────────────────────────────────────────

/// One fully-resolved call to the model runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// System message; always the persona's instruction text.
    pub system: String,
    /// User message; always the question, unmodified.
    pub user: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new match arms.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Ollama(providers::ollama::OllamaProvider),
    Dummy(providers::dummy::DummyProvider),
    /// In-process test double; only built with the `testing` feature.
    #[cfg(any(test, feature = "testing"))]
    Scripted(providers::scripted::ScriptedProvider),
}

impl LlmProvider {
    /// Send one invocation to the runtime and return its text reply verbatim.
    pub async fn complete(&self, invocation: &Invocation) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Ollama(p) => p.complete(invocation).await,
            LlmProvider::Dummy(p) => p.complete(invocation).await,
            #[cfg(any(test, feature = "testing"))]
            LlmProvider::Scripted(p) => p.complete(invocation).await,
        }
    }

    /// Cheap reachability probe for health endpoints.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        match self {
            LlmProvider::Ollama(p) => p.ping().await,
            LlmProvider::Dummy(_) => Ok(()),
            #[cfg(any(test, feature = "testing"))]
            LlmProvider::Scripted(_) => Ok(()),
        }
    }

    /// Short provider name for logs and health output.
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Ollama(_) => "ollama",
            LlmProvider::Dummy(_) => "dummy",
            #[cfg(any(test, feature = "testing"))]
            LlmProvider::Scripted(_) => "scripted",
        }
    }
}
