//! Scripted provider: replays queued outcomes and records every invocation.
//!
//! Stands in for the model runtime in tests: queue the replies (or failures)
//! the runtime should produce, drive the pipeline, then inspect exactly what
//! was sent. Clones share the same queue and call log.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::llm::{Invocation, ProviderError};

#[derive(Debug)]
struct Step {
    outcome: Result<String, ProviderError>,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct Script {
    steps: VecDeque<Step>,
    calls: Vec<Invocation>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: impl Into<String>) -> &Self {
        self.push(Ok(text.into()), None)
    }

    /// Queue a successful reply that arrives only after `delay`.
    pub fn push_delayed_reply(&self, text: impl Into<String>, delay: Duration) -> &Self {
        self.push(Ok(text.into()), Some(delay))
    }

    /// Queue a failure.
    pub fn push_error(&self, err: ProviderError) -> &Self {
        self.push(Err(err), None)
    }

    fn push(&self, outcome: Result<String, ProviderError>, delay: Option<Duration>) -> &Self {
        self.lock().steps.push_back(Step { outcome, delay });
        self
    }

    /// Every invocation received so far, oldest first.
    pub fn calls(&self) -> Vec<Invocation> {
        self.lock().calls.clone()
    }

    pub async fn complete(&self, invocation: &Invocation) -> Result<String, ProviderError> {
        let step = {
            let mut script = self.lock();
            script.calls.push(invocation.clone());
            script.steps.pop_front()
        };
        let Some(step) = step else {
            return Err(ProviderError::Request("scripted provider exhausted".into()));
        };
        if let Some(delay) = step.delay {
            tokio::time::sleep(delay).await;
        }
        step.outcome
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        // A poisoned script only means an earlier test thread panicked mid-push.
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(user: &str) -> Invocation {
        Invocation {
            system: "sys".into(),
            user: user.into(),
            model: "mistral".into(),
            temperature: 0.5,
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn replays_in_order_and_records_calls() {
        let p = ScriptedProvider::new();
        p.push_reply("first")
            .push_error(ProviderError::Unreachable("connection refused".into()));

        assert_eq!(p.complete(&invocation("a")).await.unwrap(), "first");
        assert_eq!(
            p.complete(&invocation("b")).await.unwrap_err(),
            ProviderError::Unreachable("connection refused".into())
        );

        let calls = p.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].user, "a");
        assert_eq!(calls[1].user, "b");
    }

    #[tokio::test]
    async fn exhausted_script_fails() {
        let p = ScriptedProvider::new();
        assert!(p.complete(&invocation("x")).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_reply_waits() {
        let p = ScriptedProvider::new();
        p.push_delayed_reply("late", Duration::from_secs(5));
        let started = tokio::time::Instant::now();
        assert_eq!(p.complete(&invocation("q")).await.unwrap(), "late");
        assert!(started.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let p = ScriptedProvider::new();
        let clone = p.clone();
        clone.push_reply("shared");
        assert_eq!(p.complete(&invocation("q")).await.unwrap(), "shared");
        assert_eq!(clone.calls().len(), 1);
    }
}
