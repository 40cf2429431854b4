//! End-to-end chat pipeline scenarios against a scripted model runtime.

use persona_chat::catalog::Persona;
use persona_chat::conversation::{Role, Turn};
use persona_chat::generation::{GenerationRequest, GenerationService};
use persona_chat::llm::providers::scripted::ScriptedProvider;
use persona_chat::llm::{LlmProvider, ProviderError};
use persona_chat::session::ChatSession;
use persona_chat::settings::Settings;

fn scripted() -> (GenerationService, ScriptedProvider) {
    let script = ScriptedProvider::new();
    (GenerationService::new(LlmProvider::Scripted(script.clone())), script)
}

#[tokio::test]
async fn concise_arithmetic_turn() {
    let (svc, script) = scripted();
    script.push_reply("4");

    let settings = Settings::new("llama2", 0.2, 50, "Concise").unwrap();
    let request = GenerationRequest::new("What is 2+2?", settings.clone()).unwrap();
    let outcome = svc.generate(&request).await;
    assert_eq!(outcome.text(), "4");
    assert!(outcome.elapsed_seconds() >= 0.0);

    script.push_reply("4");
    let mut session = ChatSession::new(svc, settings);
    session.submit("What is 2+2?").await.unwrap();
    assert_eq!(
        session.transcript(),
        &[Turn::user("What is 2+2?"), Turn::assistant("4")]
    );
}

#[tokio::test]
async fn connection_error_becomes_assistant_turn() {
    let (svc, script) = scripted();
    script.push_error(ProviderError::Unreachable("connection refused".into()));

    let mut session = ChatSession::new(svc, Settings::default());
    let report = session.submit("hello?").await.unwrap();

    assert_eq!(report.reply, "Error: connection refused");
    assert_eq!(report.elapsed_seconds, 0.0);
    assert!(report.failed);
    assert_eq!(session.transcript()[1], Turn::assistant("Error: connection refused"));
}

#[tokio::test]
async fn system_message_is_exactly_the_persona_instruction() {
    let (svc, script) = scripted();
    let mut session = ChatSession::new(svc, Settings::default());

    for persona in Persona::ALL {
        script.push_reply("ok");
        session
            .update_settings(&persona_chat::session::SettingsPatch {
                persona: Some(persona.name().to_string()),
                ..Default::default()
            })
            .unwrap();
        session.submit("Tell me about otters").await.unwrap();
    }

    let calls = script.calls();
    assert_eq!(calls.len(), Persona::ALL.len());
    for (call, persona) in calls.iter().zip(Persona::ALL) {
        assert_eq!(call.system, persona.instruction());
        assert_eq!(call.user, "Tell me about otters");
    }
}

#[tokio::test]
async fn n_turns_give_2n_alternating_entries_even_with_failures() {
    let (svc, script) = scripted();
    script
        .push_reply("one")
        .push_error(ProviderError::ModelNotFound("llama2".into()))
        .push_reply("three")
        .push_error(ProviderError::Request("HTTP 500 Internal Server Error: boom".into()));

    let mut session = ChatSession::new(svc, Settings::default());
    for q in ["a", "b", "c", "d"] {
        session.submit(q).await.unwrap();
    }

    let t = session.transcript();
    assert_eq!(t.len(), 8);
    assert!(t.iter().step_by(2).all(|turn| turn.role() == Role::User));
    assert!(t.iter().skip(1).step_by(2).all(|turn| turn.role() == Role::Assistant));
    assert_eq!(t[3].content(), "Error: model 'llama2' not found");
    assert!(t[7].content().starts_with("Error: "));

    // Reading twice without mutation gives the same transcript.
    assert_eq!(session.transcript().to_vec(), t.to_vec());
}

#[tokio::test]
async fn clears_rotate_session_id_every_time() {
    let (svc, _) = scripted();
    let mut session = ChatSession::new(svc, Settings::default());

    let s0 = session.session_id();
    let s1 = session.clear();
    let s2 = session.clear();

    assert_ne!(s0, s1);
    assert_ne!(s1, s2);
    assert!(session.transcript().is_empty());
}
