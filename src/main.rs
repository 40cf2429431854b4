//! persona-chat entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Build the model runtime provider and the chat session
//!   5. Run the enabled shells until Ctrl-C or the console closes

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use persona_chat::error::AppError;
use persona_chat::generation::GenerationService;
use persona_chat::llm::providers;
use persona_chat::session::ChatSession;
use persona_chat::{config, logger, shell};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level, true)?;

    info!(
        app = %config.app_name,
        provider = %config.runtime.provider,
        base_url = %config.runtime.base_url,
        log_level = %config.log_level,
        "config loaded"
    );

    match &config.telemetry_key {
        Some(_) => info!("telemetry key present"),
        None => info!("no telemetry key set; tracing export disabled"),
    }

    let provider = providers::build(&config.runtime)
        .map_err(|e| AppError::Config(format!("runtime provider: {e}")))?;

    if let Err(e) = provider.ping().await {
        warn!(error = %e, "model runtime not reachable yet; turns will report errors until it is");
    }

    let session = shell::share(ChatSession::new(
        GenerationService::new(provider.clone()),
        config.chat.clone(),
    ));

    let shutdown = CancellationToken::new();
    let handle = shell::start(&config, session, provider, shutdown.clone())?;

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrl_c.cancel();
        }
    });

    handle.join().await?;
    info!("bye");
    Ok(())
}
