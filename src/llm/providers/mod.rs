//! Model runtime provider implementations.
//!
//! `build(config)` is the factory: called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod ollama;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

use tracing::debug;

use crate::config::RuntimeConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct an `LlmProvider` from the `[runtime]` config section.
///
/// `scripted` is not constructible from config; tests build it directly
/// with the `testing` feature on.
pub fn build(config: &RuntimeConfig) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "ollama" => {
            debug!(base_url = %config.base_url, timeout_seconds = config.timeout_seconds, "building ollama provider");
            let p = ollama::OllamaProvider::new(config.base_url.clone(), config.timeout_seconds)?;
            Ok(LlmProvider::Ollama(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime(provider: &str) -> RuntimeConfig {
        RuntimeConfig {
            provider: provider.into(),
            base_url: "http://localhost:11434".into(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn builds_known_providers() {
        assert_eq!(build(&runtime("dummy")).unwrap().name(), "dummy");
        assert_eq!(build(&runtime("ollama")).unwrap().name(), "ollama");
    }

    #[test]
    fn unknown_provider_errors() {
        let err = build(&runtime("scripted")).unwrap_err();
        assert_eq!(err, ProviderError::UnknownProvider("scripted".into()));
    }
}
