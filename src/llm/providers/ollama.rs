//! Ollama chat provider (`POST /api/chat`, non-streaming).
//!
//! All Ollama wire types are private to this module: callers only see
//! [`Invocation`] going in and a `String` coming out. The provider is
//! stateless; conversation history is never sent, only the system
//! instruction and the current question.

use std::error::Error as _;
use std::io;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{Invocation, ProviderError};

/// Hard timeout for [`OllamaProvider::ping`], independent of the chat timeout.
const PING_TIMEOUT: Duration = Duration::from_secs(5);

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for a local (or remote) Ollama server.
///
/// Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl OllamaProvider {
    /// `base_url` is the server root, e.g. `http://localhost:11434`.
    pub fn new(base_url: impl Into<String>, timeout_seconds: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    /// Lightweight reachability probe.
    ///
    /// Lists local models via `GET /api/tags`. Any HTTP response means the
    /// server is up; only a transport failure counts as unreachable.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        self.client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(PING_TIMEOUT)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::Unreachable(format!("unreachable: {e}")))
    }

    /// One round-trip: system + user message in, assistant text out.
    ///
    /// The reply is returned exactly as the runtime produced it.
    pub async fn complete(&self, invocation: &Invocation) -> Result<String, ProviderError> {
        let payload = ChatRequest::from_invocation(invocation);
        let url = self.chat_url();

        debug!(
            model = %payload.model,
            temperature = payload.options.temperature,
            num_predict = payload.options.num_predict,
            question_len = invocation.user.len(),
            "sending chat request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full chat request payload");
        }

        let response = self.client.post(&url).json(&payload).send().await.map_err(|e| {
            error!(%url, error = %e, timeout = e.is_timeout(), "chat request failed (transport)");
            ProviderError::Unreachable(describe_transport_error(&e))
        })?;

        let response = check_status(response, &invocation.model).await?;

        let parsed = response.json::<ChatResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize chat response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        debug!(
            done = parsed.done,
            eval_count = ?parsed.eval_count,
            "received chat response"
        );

        parsed
            .message
            .map(|m| m.content)
            .ok_or_else(|| ProviderError::Request("missing message in response".into()))
    }
}

/// Condense a reqwest transport error into the message shown to the user.
///
/// Only a refused TCP connect reads "connection refused"; other connect
/// failures (DNS, unreachable host) keep their root cause.
fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        return "request to model runtime timed out".to_string();
    }
    match io_error_kind(e) {
        Some(io::ErrorKind::ConnectionRefused) => "connection refused".to_string(),
        _ if e.is_connect() => format!("cannot connect to model runtime: {}", root_cause(e)),
        _ => e.to_string(),
    }
}

/// Kind of the first `io::Error` in the source chain, if any.
fn io_error_kind(e: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = e.source();
    while let Some(err) = source {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = err.source();
    }
    None
}

fn root_cause(e: &reqwest::Error) -> String {
    let mut cause: &dyn std::error::Error = e;
    while let Some(next) = cause.source() {
        cause = next;
    }
    cause.to_string()
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    stream: bool,
    options: Options,
}

impl<'a> ChatRequest<'a> {
    fn from_invocation(inv: &'a Invocation) -> Self {
        Self {
            model: &inv.model,
            messages: [
                WireMessage { role: "system", content: &inv.system },
                WireMessage { role: "user", content: &inv.user },
            ],
            stream: false,
            options: Options {
                temperature: inv.temperature,
                num_predict: inv.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

// Ollama reports failures as `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// Return the response if successful, otherwise a structured error.
async fn check_status(
    response: reqwest::Response,
    model: &str,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let err = classify_error(status, &body, model);
    error!(%status, error = %err, "chat request returned HTTP error");
    Err(err)
}

fn classify_error(status: StatusCode, body: &str, model: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error)
        .unwrap_or_else(|_| body.trim().to_string());

    if status == StatusCode::NOT_FOUND && message.contains("not found") {
        ProviderError::ModelNotFound(model.to_string())
    } else {
        ProviderError::Request(format!("HTTP {status}: {message}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation() -> Invocation {
        Invocation {
            system: "You are a concise assistant.".into(),
            user: "What is 2+2?".into(),
            model: "llama2".into(),
            temperature: 0.2,
            max_tokens: 50,
        }
    }

    #[test]
    fn request_body_matches_ollama_chat_shape() {
        let inv = invocation();
        let body = serde_json::to_value(ChatRequest::from_invocation(&inv)).unwrap();
        assert_eq!(body["model"], "llama2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are a concise assistant.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "What is 2+2?");
        assert_eq!(body["options"]["num_predict"], 50);
        let t = body["options"]["temperature"].as_f64().unwrap();
        assert!((t - 0.2).abs() < 1e-6);
    }

    #[test]
    fn response_content_is_kept_verbatim() {
        let raw = r#"{"model":"llama2","message":{"role":"assistant","content":"  4\n"},"done":true}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.message.unwrap().content, "  4\n");
    }

    #[test]
    fn missing_model_maps_to_model_not_found() {
        let body = r#"{"error":"model 'llama9' not found, try pulling it first"}"#;
        let err = classify_error(StatusCode::NOT_FOUND, body, "llama9");
        assert_eq!(err, ProviderError::ModelNotFound("llama9".into()));
    }

    #[test]
    fn other_http_errors_carry_status_and_message() {
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, r#"{"error":"boom"}"#, "llama2");
        assert_eq!(err.to_string(), "HTTP 500 Internal Server Error: boom");
    }

    #[test]
    fn non_json_error_body_is_used_raw() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "upstream down\n", "llama2");
        assert_eq!(err.to_string(), "HTTP 502 Bad Gateway: upstream down");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let p = OllamaProvider::new("http://localhost:11434/", 5).unwrap();
        assert_eq!(p.chat_url(), "http://localhost:11434/api/chat");
    }

    #[tokio::test]
    async fn closed_port_reads_connection_refused() {
        // Bind then release a loopback port so nothing is listening on it.
        let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let p = OllamaProvider::new(format!("http://{addr}"), 2).unwrap();
        let err = p.complete(&invocation()).await.unwrap_err();
        assert_eq!(err, ProviderError::Unreachable("connection refused".into()));
        assert_eq!(format!("Error: {err}"), "Error: connection refused");
    }

    #[tokio::test]
    async fn unresolvable_host_is_not_called_refused() {
        let p = OllamaProvider::new("http://runtime.invalid:11434", 2).unwrap();
        let err = p.complete(&invocation()).await.unwrap_err();
        match err {
            ProviderError::Unreachable(msg) => assert_ne!(msg, "connection refused"),
            other => panic!("expected Unreachable, got {other:?}"),
        }
    }
}
