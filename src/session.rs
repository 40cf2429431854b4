//! `ChatSession`: the per-user turn loop shared by every shell.
//!
//! Owns the [`Conversation`], the current [`Settings`] and the
//! [`GenerationService`]. One call to [`ChatSession::submit`] is one full
//! turn: generate, then append the user and assistant turns together. The
//! `&mut self` receiver means a turn can never interleave with another
//! mutation, and a turn dropped mid-generation records nothing.

use serde::Serialize;
use tracing::{debug, info};

use crate::conversation::{Conversation, Turn};
use crate::generation::{GenerationRequest, GenerationService};
use crate::settings::{Settings, SettingsError};

/// What a shell needs to render after a turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    pub session_id: String,
    pub reply: String,
    pub elapsed_seconds: f64,
    /// `true` when the reply is a folded runtime error.
    pub failed: bool,
}

/// Partial settings update; `None` fields are left as they are.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SettingsPatch {
    pub model: Option<String>,
    pub persona: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

pub struct ChatSession {
    conversation: Conversation,
    settings: Settings,
    service: GenerationService,
}

impl ChatSession {
    pub fn new(service: GenerationService, settings: Settings) -> Self {
        let conversation = Conversation::new();
        info!(session_id = %conversation.session_id(), provider = service.provider().name(), "chat session started");
        Self { conversation, settings, service }
    }

    /// Run one turn. Blank input is ignored and returns `None`.
    pub async fn submit(&mut self, question: &str) -> Option<TurnReport> {
        let request = match GenerationRequest::new(question, self.settings.clone()) {
            Ok(r) => r,
            Err(_) => {
                debug!("ignoring blank input");
                return None;
            }
        };

        let outcome = self.service.generate(&request).await;
        let elapsed_seconds = outcome.elapsed_seconds();
        let failed = outcome.is_failure();
        let reply = outcome.into_text();

        // No await between these two appends.
        self.conversation.append(Turn::user(request.question()));
        self.conversation.append(Turn::assistant(reply.clone()));

        debug!(
            session_id = %self.conversation.session_id(),
            turns = self.conversation.len(),
            failed,
            "turn recorded"
        );

        Some(TurnReport {
            session_id: self.conversation.session_id(),
            reply,
            elapsed_seconds,
            failed,
        })
    }

    /// Wipe the transcript and start a new session; returns the new id.
    pub fn clear(&mut self) -> String {
        let old = self.conversation.session_id();
        self.conversation.clear();
        let new = self.conversation.session_id();
        info!(%old, %new, "conversation cleared");
        new
    }

    pub fn transcript(&self) -> &[Turn] {
        self.conversation.all()
    }

    pub fn session_id(&self) -> String {
        self.conversation.session_id()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply a partial update atomically: either every field applies or none do.
    pub fn update_settings(&mut self, patch: &SettingsPatch) -> Result<&Settings, SettingsError> {
        let mut next = self.settings.clone();
        if let Some(model) = &patch.model {
            next.set_model(model)?;
        }
        if let Some(persona) = &patch.persona {
            next.set_persona(persona)?;
        }
        if let Some(t) = patch.temperature {
            next.set_temperature(t)?;
        }
        if let Some(n) = patch.max_tokens {
            next.set_max_tokens(n)?;
        }
        debug!(?next, "settings updated");
        self.settings = next;
        Ok(&self.settings)
    }
}
