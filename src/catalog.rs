//! Static prompt personas and the model registry.
//!
//! Both tables are fixed at compile time. Shells list them to build their
//! selectors; the generation pipeline only ever receives values resolved
//! from here, so lookups past this point cannot miss.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Personas ──────────────────────────────────────────────────────────────────

/// A named system instruction shaping the model's response style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Persona {
    #[default]
    Default,
    Professional,
    Creative,
    Concise,
}

impl Persona {
    /// Every persona, in selector order.
    pub const ALL: [Persona; 4] = [
        Persona::Default,
        Persona::Professional,
        Persona::Creative,
        Persona::Concise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Persona::Default => "Default",
            Persona::Professional => "Professional",
            Persona::Creative => "Creative",
            Persona::Concise => "Concise",
        }
    }

    /// System instruction sent ahead of the user's question.
    pub fn instruction(self) -> &'static str {
        match self {
            Persona::Default => {
                "You are a helpful assistant. Please respond to the user queries."
            }
            Persona::Professional => {
                "You are a professional consultant with expertise in various fields. \
                 Please provide detailed, well-structured, and accurate information."
            }
            Persona::Creative => {
                "You are a creative assistant with a flair for imaginative responses. \
                 Feel free to think outside the box while being helpful."
            }
            Persona::Concise => {
                "You are a concise assistant. Provide brief, clear answers without unnecessary details."
            }
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown persona: {0}")]
pub struct UnknownPersona(pub String);

impl FromStr for Persona {
    type Err = UnknownPersona;

    /// Case-insensitive match on the persona name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Persona::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPersona(s.to_string()))
    }
}

// ── Models ────────────────────────────────────────────────────────────────────

/// One entry of the model registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Identifier passed verbatim to the model runtime.
    pub id: &'static str,
    pub description: &'static str,
}

const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gemma2:2b",
        description: "Google's Gemma 2B - Lightweight model good for simple tasks",
    },
    ModelInfo {
        id: "mistral",
        description: "Mistral - Well-balanced language model with good reasoning capabilities",
    },
    ModelInfo {
        id: "llama2",
        description: "Meta's LLaMA 2 - General purpose language model",
    },
    ModelInfo {
        id: "phi3:mini",
        description: "Microsoft's Phi-3 Mini - Compact but powerful model",
    },
    ModelInfo {
        id: "llama3.2",
        description: "Meta's LLaMA 3.2 - Latest generation with enhanced capabilities",
    },
];

/// Read-only view over the fixed model table.
pub struct ModelRegistry;

impl ModelRegistry {
    /// All models, in selector order.
    pub fn all() -> &'static [ModelInfo] {
        MODELS
    }

    pub fn get(id: &str) -> Option<&'static ModelInfo> {
        MODELS.iter().find(|m| m.id == id)
    }

    /// First registry entry; the selector's initial choice.
    pub fn default_model() -> &'static ModelInfo {
        &MODELS[0]
    }
}
