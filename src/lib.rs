//! persona-chat: a persona-driven chat front-end for a local model runtime.
//!
//! ```text
//! shell (pty / http) ──► ChatSession::submit
//!                          ├─ Conversation::append(user)
//!                          ├─ GenerationService::generate ──► LlmProvider
//!                          └─ Conversation::append(assistant)
//! ```

pub mod catalog;
pub mod config;
pub mod conversation;
pub mod error;
pub mod generation;
pub mod llm;
pub mod logger;
pub mod session;
pub mod settings;
pub mod shell;
