//! Chat settings: the four knobs every generation is made with.
//!
//! A [`Settings`] value is always valid: model and persona come from the
//! fixed catalogs and the numeric knobs sit inside their ranges. Every
//! setter re-checks, so shells can feed raw user input straight in.

use std::ops::RangeInclusive;

use serde::Serialize;
use thiserror::Error;

use crate::catalog::{ModelRegistry, Persona};

pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 50..=1000;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 250;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("unknown persona: {0}")]
    UnknownPersona(String),
    #[error("temperature must be between 0 and 1, got {0}")]
    Temperature(f32),
    #[error("max tokens must be between 50 and 1000, got {0}")]
    MaxTokens(u32),
    #[error("question must not be empty")]
    EmptyQuestion,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    model: &'static str,
    persona: Persona,
    temperature: f32,
    max_tokens: u32,
}

impl Settings {
    pub fn new(
        model: &str,
        temperature: f32,
        max_tokens: u32,
        persona: &str,
    ) -> Result<Self, SettingsError> {
        let mut s = Self::default();
        s.set_model(model)?;
        s.set_temperature(temperature)?;
        s.set_max_tokens(max_tokens)?;
        s.set_persona(persona)?;
        Ok(s)
    }

    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn set_model(&mut self, id: &str) -> Result<(), SettingsError> {
        let info = ModelRegistry::get(id.trim())
            .ok_or_else(|| SettingsError::UnknownModel(id.to_string()))?;
        self.model = info.id;
        Ok(())
    }

    pub fn set_persona(&mut self, name: &str) -> Result<(), SettingsError> {
        self.persona = name
            .parse()
            .map_err(|_| SettingsError::UnknownPersona(name.to_string()))?;
        Ok(())
    }

    pub fn set_temperature(&mut self, t: f32) -> Result<(), SettingsError> {
        // NaN fails `contains` as well.
        if !TEMPERATURE_RANGE.contains(&t) {
            return Err(SettingsError::Temperature(t));
        }
        self.temperature = t;
        Ok(())
    }

    pub fn set_max_tokens(&mut self, n: u32) -> Result<(), SettingsError> {
        if !MAX_TOKENS_RANGE.contains(&n) {
            return Err(SettingsError::MaxTokens(n));
        }
        self.max_tokens = n;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: ModelRegistry::default_model().id,
            persona: Persona::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}
