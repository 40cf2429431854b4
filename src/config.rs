//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory, or
//! the file named by `ASSISTANT_CONFIG` (a leading `~` is expanded), then
//! applies `ASSISTANT_LOG_LEVEL` and `ASSISTANT_RUNTIME_URL` overrides.
//! The optional telemetry key comes from `ASSISTANT_TELEMETRY_KEY` only,
//! never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;
use crate::settings::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, Settings};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Model runtime connection (`[runtime]`).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// `"ollama"` or `"dummy"`.
    pub provider: String,
    /// Server root, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Colour scheme of the HTTP shell's page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Console shell (`[shell.pty]`).
#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub enabled: bool,
}

/// HTTP shell (`[shell.http]`).
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    /// Socket address to bind to.
    pub bind: String,
    pub theme: Theme,
}

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub pty: PtyConfig,
    pub http: HttpConfig,
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub app_name: String,
    pub log_level: String,
    pub runtime: RuntimeConfig,
    /// Initial chat settings (`[chat]`), already validated.
    pub chat: Settings,
    pub shell: ShellConfig,
    /// External tracing key from `ASSISTANT_TELEMETRY_KEY`; absent is fine.
    pub telemetry_key: Option<String>,
}

/// Env-sourced overrides, passed explicitly so tests never touch the env.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub log_level: Option<&'a str>,
    pub runtime_url: Option<&'a str>,
    pub telemetry_key: Option<&'a str>,
}

// ── Raw TOML shape ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawConfig {
    app: RawApp,
    #[serde(default)]
    runtime: RawRuntime,
    #[serde(default)]
    chat: RawChat,
    #[serde(default)]
    shell: RawShell,
}

#[derive(Deserialize)]
struct RawApp {
    #[serde(default = "default_app_name")]
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize)]
struct RawRuntime {
    #[serde(default = "default_provider")]
    provider: String,
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawRuntime {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Deserialize, Default)]
struct RawChat {
    model: Option<String>,
    persona: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Deserialize, Default)]
struct RawShell {
    #[serde(default)]
    pty: RawPty,
    #[serde(default)]
    http: RawHttp,
}

#[derive(Deserialize)]
struct RawPty {
    /// Defaults to `true`: the console is the fallback shell.
    #[serde(default = "default_true")]
    enabled: bool,
}

impl Default for RawPty {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Deserialize)]
struct RawHttp {
    /// Defaults to `false`: HTTP must be explicitly enabled.
    #[serde(default)]
    enabled: bool,
    #[serde(default = "default_http_bind")]
    bind: String,
    #[serde(default = "default_theme")]
    theme: Theme,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self { enabled: false, bind: default_http_bind(), theme: default_theme() }
    }
}

fn default_app_name() -> String { "persona-chat".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_provider() -> String { "ollama".to_string() }
fn default_base_url() -> String { "http://localhost:11434".to_string() }
fn default_timeout_seconds() -> u64 { 120 }
fn default_http_bind() -> String { "127.0.0.1:8501".to_string() }
fn default_theme() -> Theme { Theme::Light }
fn default_true() -> bool { true }

// ── Loading ───────────────────────────────────────────────────────────────────

/// Load config from [`config_path`], then apply env-var overrides.
pub fn load() -> Result<Config, AppError> {
    let config_env = env::var("ASSISTANT_CONFIG").ok();
    let log_level = env::var("ASSISTANT_LOG_LEVEL").ok();
    let runtime_url = env::var("ASSISTANT_RUNTIME_URL").ok();
    let telemetry_key = env::var("ASSISTANT_TELEMETRY_KEY").ok();
    load_from(
        &config_path(config_env.as_deref()),
        Overrides {
            log_level: log_level.as_deref(),
            runtime_url: runtime_url.as_deref(),
            telemetry_key: telemetry_key.as_deref(),
        },
    )
}

/// Config file location: `ASSISTANT_CONFIG` when set and non-blank,
/// otherwise [`DEFAULT_CONFIG_PATH`].
pub fn config_path(from_env: Option<&str>) -> PathBuf {
    match from_env.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => expand_home(p),
        None => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Load from an explicit path with explicit overrides.
pub fn load_from(path: &Path, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    parse(&raw, overrides)
        .map_err(|e| match e {
            AppError::Config(msg) => AppError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
}

/// Parse TOML text into a resolved [`Config`].
pub fn parse(text: &str, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let parsed: RawConfig =
        toml::from_str(text).map_err(|e| AppError::Config(format!("parse error: {e}")))?;

    let defaults = Settings::default();
    let c = parsed.chat;
    let chat = Settings::new(
        c.model.as_deref().unwrap_or(defaults.model()),
        c.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        c.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        c.persona.as_deref().unwrap_or(defaults.persona().name()),
    )
    .map_err(|e| AppError::Config(format!("[chat] {e}")))?;

    if parsed.runtime.timeout_seconds == 0 {
        return Err(AppError::Config("[runtime] timeout_seconds must be > 0".into()));
    }

    let log_level = overrides.log_level.map(str::to_string).unwrap_or(parsed.app.log_level);
    logger::parse_level(&log_level).map_err(|e| AppError::Config(format!("[app] {e}")))?;

    let base_url = overrides
        .runtime_url
        .map(str::to_string)
        .unwrap_or(parsed.runtime.base_url);

    Ok(Config {
        app_name: parsed.app.name,
        log_level,
        runtime: RuntimeConfig {
            provider: parsed.runtime.provider,
            base_url,
            timeout_seconds: parsed.runtime.timeout_seconds,
        },
        chat,
        shell: ShellConfig {
            pty: PtyConfig { enabled: parsed.shell.pty.enabled },
            http: HttpConfig {
                enabled: parsed.shell.http.enabled,
                bind: parsed.shell.http.bind,
                theme: parsed.shell.http.theme,
            },
        },
        telemetry_key: overrides
            .telemetry_key
            .filter(|k| !k.trim().is_empty())
            .map(str::to_string),
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Persona;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[app]
name = "test-chat"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Overrides::default()).unwrap();
        assert_eq!(cfg.app_name, "test-chat");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.runtime.provider, "ollama");
        assert_eq!(cfg.runtime.base_url, "http://localhost:11434");
        assert_eq!(cfg.chat, Settings::default());
        assert!(cfg.shell.pty.enabled);
        assert!(!cfg.shell.http.enabled);
        assert_eq!(cfg.shell.http.theme, Theme::Light);
        assert!(cfg.telemetry_key.is_none());
    }

    #[test]
    fn full_config_parses() {
        let cfg = parse(
            r#"
[app]
name = "x"
log_level = "debug"

[runtime]
provider = "dummy"
base_url = "http://gpu-box:11434"
timeout_seconds = 30

[chat]
model = "llama2"
persona = "Concise"
temperature = 0.2
max_tokens = 50

[shell.pty]
enabled = false

[shell.http]
enabled = true
bind = "0.0.0.0:9000"
theme = "dark"
"#,
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.runtime.timeout_seconds, 30);
        assert_eq!(cfg.chat.model(), "llama2");
        assert_eq!(cfg.chat.persona(), Persona::Concise);
        assert_eq!(cfg.chat.max_tokens(), 50);
        assert!(!cfg.shell.pty.enabled);
        assert!(cfg.shell.http.enabled);
        assert_eq!(cfg.shell.http.bind, "0.0.0.0:9000");
        assert_eq!(cfg.shell.http.theme, Theme::Dark);
    }

    #[test]
    fn invalid_chat_defaults_are_rejected() {
        let err = parse("[app]\n[chat]\nmax_tokens = 5000\n", Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("max tokens"), "{err}");

        let err = parse("[app]\n[chat]\nmodel = \"gpt-4o\"\n", Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("unknown model"), "{err}");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(parse("[app]\n[runtime]\ntimeout_seconds = 0\n", Overrides::default()).is_err());
    }

    #[test]
    fn overrides_win() {
        let cfg = parse(
            MINIMAL_TOML,
            Overrides {
                log_level: Some("trace"),
                runtime_url: Some("http://10.0.0.2:11434"),
                telemetry_key: Some("abc"),
            },
        )
        .unwrap();
        assert_eq!(cfg.log_level, "trace");
        assert_eq!(cfg.runtime.base_url, "http://10.0.0.2:11434");
        assert_eq!(cfg.telemetry_key.as_deref(), Some("abc"));
    }

    #[test]
    fn blank_telemetry_key_counts_as_absent() {
        let cfg = parse(
            MINIMAL_TOML,
            Overrides { telemetry_key: Some("  "), ..Default::default() },
        )
        .unwrap();
        assert!(cfg.telemetry_key.is_none());
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), Overrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn missing_app_section_errors() {
        assert!(parse("[runtime]\nprovider = \"dummy\"\n", Overrides::default()).is_err());
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = parse("[app]\nlog_level = \"verbose\"\n", Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("verbose"), "{err}");

        let err = parse(MINIMAL_TOML, Overrides { log_level: Some("loud"), ..Default::default() })
            .unwrap_err();
        assert!(err.to_string().contains("loud"), "{err}");
    }

    #[test]
    fn config_path_comes_from_env_value() {
        assert_eq!(config_path(None), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(config_path(Some("  ")), PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(config_path(Some("/etc/chat.toml")), PathBuf::from("/etc/chat.toml"));

        let home = dirs::home_dir().expect("home dir must exist in test env");
        assert_eq!(config_path(Some("~/chat.toml")), home.join("chat.toml"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/chat.toml");
        assert!(expanded.starts_with(&home));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/etc/chat.toml"), PathBuf::from("/etc/chat.toml"));
    }

    #[test]
    fn shipped_default_config_parses() {
        let cfg = load_from(
            &Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH),
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(cfg.runtime.provider, "ollama");
    }
}
