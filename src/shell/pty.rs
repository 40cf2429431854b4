//! PTY (console) shell: reads lines from stdin, runs one chat turn per
//! line, prints the reply to stdout.
//!
//! Lines starting with `/` are commands (see [`Command`]); everything else is
//! a question. Runs until the `shutdown` token is cancelled or stdin is
//! closed. `/quit` cancels `shutdown` itself and so stops the other shells
//! too; a closed stdin (headless start) leaves them running.

use std::fmt::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog::{ModelRegistry, Persona};
use crate::session::SettingsPatch;

use super::{Component, ComponentFuture, SharedSession};

const HELP: &str = "\
Commands:
  /help                 show this help
  /clear                clear the chat and start a new session
  /models               list available models
  /personas             list prompt personas
  /model <id>           switch model
  /persona <name>       switch persona
  /temperature <0-1>    set sampling temperature
  /max-tokens <50-1000> set response token limit
  /settings             show current settings
  /history              reprint the conversation
  /quit                 leave";

// ── Command parsing ───────────────────────────────────────────────────────────

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ask(String),
    Help,
    Clear,
    Models,
    Personas,
    Settings,
    History,
    Quit,
    Update(SettingsUpdate),
    Invalid(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsUpdate {
    Model(String),
    Persona(String),
    Temperature(f32),
    MaxTokens(u32),
}

impl Command {
    /// Questions keep the line exactly as typed; trimming only decides
    /// whether the line is blank or a command.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }
        let Some(rest) = trimmed.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a.trim()),
            None => (rest, ""),
        };

        match (name, arg) {
            ("help" | "?", _) => Command::Help,
            ("clear" | "reset", _) => Command::Clear,
            ("models", _) => Command::Models,
            ("personas", _) => Command::Personas,
            ("settings", _) => Command::Settings,
            ("history", _) => Command::History,
            ("quit" | "exit", _) => Command::Quit,
            ("model" | "persona" | "temperature" | "max-tokens", "") => {
                Command::Invalid(format!("/{name} needs a value"))
            }
            ("model", id) => Command::Update(SettingsUpdate::Model(id.to_string())),
            ("persona", p) => Command::Update(SettingsUpdate::Persona(p.to_string())),
            ("temperature", t) => match t.parse::<f32>() {
                Ok(t) => Command::Update(SettingsUpdate::Temperature(t)),
                Err(_) => Command::Invalid(format!("not a number: {t}")),
            },
            ("max-tokens", n) => match n.parse::<u32>() {
                Ok(n) => Command::Update(SettingsUpdate::MaxTokens(n)),
                Err(_) => Command::Invalid(format!("not a whole number: {n}")),
            },
            _ => Command::Invalid(format!("unknown command /{name}, try /help")),
        }
    }
}

impl SettingsUpdate {
    fn into_patch(self) -> SettingsPatch {
        let mut patch = SettingsPatch::default();
        match self {
            SettingsUpdate::Model(m) => patch.model = Some(m),
            SettingsUpdate::Persona(p) => patch.persona = Some(p),
            SettingsUpdate::Temperature(t) => patch.temperature = Some(t),
            SettingsUpdate::MaxTokens(n) => patch.max_tokens = Some(n),
        }
        patch
    }
}

// ── Line handling ─────────────────────────────────────────────────────────────

/// Text to print for one input line, plus whether the shell should stop.
#[derive(Debug, Clone, PartialEq)]
pub struct LineResult {
    pub output: String,
    pub quit: bool,
}

impl LineResult {
    fn print(output: impl Into<String>) -> Self {
        Self { output: output.into(), quit: false }
    }
}

/// Execute one console line against the shared session.
pub async fn handle_line(session: &SharedSession, line: &str) -> LineResult {
    match Command::parse(line) {
        Command::Empty => LineResult::print(""),
        Command::Quit => LineResult { output: "bye".into(), quit: true },
        Command::Help => LineResult::print(HELP),
        Command::Invalid(msg) => LineResult::print(msg),
        Command::Models => {
            let current = session.lock().await.settings().model();
            let mut out = String::new();
            for m in ModelRegistry::all() {
                let marker = if m.id == current { '*' } else { ' ' };
                let _ = writeln!(out, "{marker} {:<10} {}", m.id, m.description);
            }
            LineResult::print(out.trim_end())
        }
        Command::Personas => {
            let current = session.lock().await.settings().persona();
            let mut out = String::new();
            for p in Persona::ALL {
                let marker = if p == current { '*' } else { ' ' };
                let _ = writeln!(out, "{marker} {:<12} {}", p.name(), p.instruction());
            }
            LineResult::print(out.trim_end())
        }
        Command::Settings => {
            let s = session.lock().await;
            LineResult::print(describe_settings(&s))
        }
        Command::History => {
            let s = session.lock().await;
            let mut out = String::new();
            for turn in s.transcript() {
                let _ = writeln!(out, "[{}] {}", turn.role(), turn.content());
            }
            let _ = write!(out, "(session {})", s.session_id());
            LineResult::print(out)
        }
        Command::Clear => {
            let id = session.lock().await.clear();
            LineResult::print(format!("chat cleared, new session {id}"))
        }
        Command::Update(update) => {
            let mut s = session.lock().await;
            let applied = s.update_settings(&update.into_patch()).map(|_| ());
            match applied {
                Ok(()) => LineResult::print(describe_settings(&s)),
                Err(e) => LineResult::print(e.to_string()),
            }
        }
        Command::Ask(question) => {
            let report = session.lock().await.submit(&question).await;
            match report {
                Some(r) if r.failed => LineResult::print(r.reply),
                Some(r) => LineResult::print(format!(
                    "{}\n\nResponse generated in {} seconds",
                    r.reply, r.elapsed_seconds
                )),
                None => LineResult::print(""),
            }
        }
    }
}

fn describe_settings(s: &crate::session::ChatSession) -> String {
    let settings = s.settings();
    format!(
        "model={} persona={} temperature={} max_tokens={}",
        settings.model(),
        settings.persona(),
        settings.temperature(),
        settings.max_tokens()
    )
}

// ── PtyShell ──────────────────────────────────────────────────────────────────

pub struct PtyShell {
    shell_id: String,
    session: SharedSession,
}

impl PtyShell {
    pub fn new(shell_id: impl Into<String>, session: SharedSession) -> Self {
        Self { shell_id: shell_id.into(), session }
    }
}

impl Component for PtyShell {
    fn id(&self) -> &str {
        &self.shell_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_pty(self.shell_id, self.session, shutdown))
    }
}

async fn run_pty(
    shell_id: String,
    session: SharedSession,
    shutdown: CancellationToken,
) -> Result<(), crate::error::AppError> {
    info!(%shell_id, "pty shell started");
    {
        let s = session.lock().await;
        println!("─────────────────────────────────────────");
        println!(" AI Assistant  (/help for commands, Ctrl-C to quit)");
        println!(" {}", describe_settings(&s));
        println!("─────────────────────────────────────────");
    }

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("> ");
        use std::io::Write as _;
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!();
                info!(%shell_id, "pty shell shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("pty read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("pty stdin closed");
                        break;
                    }
                    Ok(Some(input)) => {
                        debug!(len = input.len(), "pty received line");
                        let result = handle_line(&session, &input).await;
                        if !result.output.is_empty() {
                            println!("{}", result.output);
                        }
                        if result.quit {
                            // An explicit quit ends every shell, not just this one.
                            shutdown.cancel();
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
