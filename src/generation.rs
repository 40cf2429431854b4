//! Generation service: one question in, one transcript-ready outcome out.
//!
//! ```text
//! GenerationRequest ──► [system: persona instruction, user: question]
//!                   ──► LlmProvider::complete
//!                   ──► GenerationOutcome::Answer { text, elapsed }
//!                     | GenerationOutcome::Failure { "Error: …" }
//! ```
//!
//! Runtime failures never leave this module as errors. They are folded into
//! [`GenerationOutcome::Failure`], whose text is shown to the user as the
//! assistant's reply.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::Persona;
use crate::llm::{Invocation, LlmProvider};
use crate::settings::{Settings, SettingsError};

/// Prefix of every failure text placed in the transcript.
pub const ERROR_PREFIX: &str = "Error: ";

/// A question paired with the settings it should be answered with.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    question: String,
    settings: Settings,
}

impl GenerationRequest {
    /// Pair a non-empty question with an already-valid settings snapshot.
    pub fn new(question: impl Into<String>, settings: Settings) -> Result<Self, SettingsError> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(SettingsError::EmptyQuestion);
        }
        Ok(Self { question, settings })
    }

    /// Build a request from raw selector values, validating each one.
    pub fn from_parts(
        question: impl Into<String>,
        model_id: &str,
        temperature: f32,
        max_tokens: u32,
        persona: &str,
    ) -> Result<Self, SettingsError> {
        Self::new(question, Settings::new(model_id, temperature, max_tokens, persona)?)
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn persona(&self) -> Persona {
        self.settings.persona()
    }

    /// The exact call the model runtime will receive.
    pub fn invocation(&self) -> Invocation {
        Invocation {
            system: self.settings.persona().instruction().to_string(),
            user: self.question.clone(),
            model: self.settings.model().to_string(),
            temperature: self.settings.temperature(),
            max_tokens: self.settings.max_tokens(),
        }
    }
}

/// Result of one generation. Both arms carry display text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GenerationOutcome {
    Answer { text: String, elapsed_seconds: f64 },
    Failure { error_text: String },
}

impl GenerationOutcome {
    /// Text to append to the transcript as the assistant turn.
    pub fn text(&self) -> &str {
        match self {
            GenerationOutcome::Answer { text, .. } => text,
            GenerationOutcome::Failure { error_text } => error_text,
        }
    }

    /// Wall-clock seconds, two decimals. Always `0.0` for failures.
    pub fn elapsed_seconds(&self) -> f64 {
        match self {
            GenerationOutcome::Answer { elapsed_seconds, .. } => *elapsed_seconds,
            GenerationOutcome::Failure { .. } => 0.0,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, GenerationOutcome::Failure { .. })
    }

    pub fn into_text(self) -> String {
        match self {
            GenerationOutcome::Answer { text, .. } => text,
            GenerationOutcome::Failure { error_text } => error_text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationService {
    provider: LlmProvider,
}

impl GenerationService {
    pub fn new(provider: LlmProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Run one request against the model runtime. Never fails.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let invocation = request.invocation();
        let started = Instant::now();

        match self.provider.complete(&invocation).await {
            Ok(text) => {
                let elapsed_seconds = round_two_places(started.elapsed().as_secs_f64());
                info!(
                    model = %invocation.model,
                    persona = %request.persona(),
                    elapsed_seconds,
                    reply_len = text.len(),
                    "generation complete"
                );
                GenerationOutcome::Answer { text, elapsed_seconds }
            }
            Err(e) => {
                warn!(
                    model = %invocation.model,
                    provider = self.provider.name(),
                    error = %e,
                    "generation failed"
                );
                GenerationOutcome::Failure { error_text: format!("{ERROR_PREFIX}{e}") }
            }
        }
    }
}

fn round_two_places(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ProviderError;
    use crate::llm::providers::scripted::ScriptedProvider;

    fn service() -> (GenerationService, ScriptedProvider) {
        let script = ScriptedProvider::new();
        (GenerationService::new(LlmProvider::Scripted(script.clone())), script)
    }

    fn is_two_places(x: f64) -> bool {
        ((x * 100.0).round() - x * 100.0).abs() < 1e-9
    }

    #[test]
    fn rounding() {
        assert_eq!(round_two_places(1.234), 1.23);
        assert_eq!(round_two_places(1.235_1), 1.24);
        assert_eq!(round_two_places(0.0), 0.0);
    }

    #[test]
    fn blank_question_is_rejected() {
        let err = GenerationRequest::new("   ", Settings::default()).unwrap_err();
        assert_eq!(err, SettingsError::EmptyQuestion);
    }

    #[test]
    fn invocation_keeps_question_out_of_system_message() {
        for persona in Persona::ALL {
            let req = GenerationRequest::from_parts("Why is the sky blue?", "mistral", 0.3, 100, persona.name())
                .unwrap();
            let inv = req.invocation();
            assert_eq!(inv.system, persona.instruction());
            assert!(!inv.system.contains("sky"));
            assert_eq!(inv.user, "Why is the sky blue?");
        }
    }

    #[tokio::test]
    async fn success_returns_text_verbatim() {
        let (svc, script) = service();
        script.push_reply("  spaced out\n");
        let req = GenerationRequest::from_parts("hi", "llama2", 0.7, 250, "Default").unwrap();

        let out = svc.generate(&req).await;
        assert_eq!(out.text(), "  spaced out\n");
        assert!(!out.is_failure());
        assert!(out.elapsed_seconds() >= 0.0);
        assert!(is_two_places(out.elapsed_seconds()));
    }

    #[tokio::test]
    async fn parameters_are_forwarded() {
        let (svc, script) = service();
        script.push_reply("4");
        let req = GenerationRequest::from_parts("What is 2+2?", "llama2", 0.2, 50, "Concise").unwrap();
        svc.generate(&req).await;

        let calls = script.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model, "llama2");
        assert_eq!(calls[0].temperature, 0.2);
        assert_eq!(calls[0].max_tokens, 50);
        assert_eq!(calls[0].system, Persona::Concise.instruction());
    }

    #[tokio::test]
    async fn failure_is_folded_into_error_text() {
        let (svc, script) = service();
        script.push_error(ProviderError::Unreachable("connection refused".into()));
        let req = GenerationRequest::new("hello", Settings::default()).unwrap();

        let out = svc.generate(&req).await;
        assert!(out.is_failure());
        assert_eq!(out.text(), "Error: connection refused");
        assert_eq!(out.elapsed_seconds(), 0.0);
    }

    #[tokio::test]
    async fn every_failure_kind_gets_the_prefix() {
        let (svc, script) = service();
        script
            .push_error(ProviderError::ModelNotFound("llama2".into()))
            .push_error(ProviderError::Request("HTTP 500: boom".into()));
        let req = GenerationRequest::new("q", Settings::default()).unwrap();

        for _ in 0..2 {
            let out = svc.generate(&req).await;
            assert!(out.text().starts_with(ERROR_PREFIX), "got {}", out.text());
            assert_eq!(out.elapsed_seconds(), 0.0);
        }
    }

    #[test]
    fn outcome_serialises_with_status_tag() {
        let json = serde_json::to_value(GenerationOutcome::Failure {
            error_text: "Error: x".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error_text"], "Error: x");
    }
}
