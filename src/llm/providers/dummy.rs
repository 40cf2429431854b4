//! Dummy provider: echoes the question back prefixed with `[echo]`.
//! Lets the shells run end to end without a model runtime.

use crate::llm::{Invocation, ProviderError};

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete(&self, invocation: &Invocation) -> Result<String, ProviderError> {
        Ok(format!("[echo] {}", invocation.user))
    }
}
