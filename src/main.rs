use std::sync::Arc;

use anyhow::Context;

use career_buddy::config::AppConfig;
use career_buddy::dialog::session::spawn_reaper_task;
use career_buddy::llm::{AiConfig, TextService, create_service};
use career_buddy::voice::routes::{VoiceState, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    eprintln!("📞 Career Buddy v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Webhook: {}/voice", config.public_base_url);
    eprintln!("   Listening: http://0.0.0.0:{}", config.port);

    // ── AI text service ──────────────────────────────────────────────────
    let service: Option<Arc<dyn TextService>> = match &config.gemini_api_key {
        Some(key) => {
            let ai_config = AiConfig {
                api_key: key.clone(),
                model: config.model.clone(),
                timeout: config.ai_timeout,
            };
            let service = create_service(&ai_config).context("Failed to create AI service")?;
            eprintln!(
                "   AI: {} (acks {})",
                config.model,
                if config.ai_acks_enabled { "on" } else { "off" }
            );
            Some(service)
        }
        None => {
            eprintln!("   AI: not configured, rule-based fallbacks only");
            None
        }
    };

    // ── Sessions ─────────────────────────────────────────────────────────
    let state = VoiceState::from_config(&config, service);
    let _reaper_handle = spawn_reaper_task(
        Arc::clone(state.engine.store()),
        config.reap_interval,
        config.session_idle_timeout,
    );

    // ── HTTP ─────────────────────────────────────────────────────────────
    serve(state, config.port)
        .await
        .with_context(|| format!("Voice server on port {} failed", config.port))?;

    Ok(())
}
