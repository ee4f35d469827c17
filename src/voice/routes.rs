//! Voice webhooks plus health and session status endpoints.

use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::twiml::TwimlRenderer;
use super::{Directive, InboundEvent};
use crate::advisor::{AckGenerator, RecommendationEngine};
use crate::config::AppConfig;
use crate::dialog::{DialogEngine, QuestionCatalog, SessionStore};
use crate::error::Result;
use crate::llm::{CooldownGate, TextService};

/// Shared state for the voice routes.
#[derive(Clone)]
pub struct VoiceState {
    pub engine: Arc<DialogEngine>,
    pub renderer: Arc<TwimlRenderer>,
}

impl VoiceState {
    /// Wire the dialog engine from configuration. Without a text service
    /// every acknowledgement and recommendation is rule-based.
    pub fn from_config(config: &AppConfig, service: Option<Arc<dyn TextService>>) -> Self {
        let gate = Arc::new(CooldownGate::new());
        let acks = AckGenerator::new(
            service.clone(),
            Arc::clone(&gate),
            config.ai_acks_enabled,
            config.ai_timeout,
        );
        let recommender = RecommendationEngine::new(service, gate, config.ai_timeout);
        let engine = DialogEngine::new(
            SessionStore::new(config.max_sessions),
            Arc::new(QuestionCatalog::builtin()),
            acks,
            recommender,
            config.chunk_max_len,
        );
        let renderer = TwimlRenderer::new(
            &config.public_base_url,
            config.gather_timeout,
            config.speech_timeout,
        );
        Self {
            engine: Arc::new(engine),
            renderer: Arc::new(renderer),
        }
    }
}

/// Form fields the voice platform posts on every webhook.
#[derive(Debug, Default, Deserialize)]
struct CallForm {
    #[serde(rename = "CallSid", default)]
    call_sid: String,
    #[serde(rename = "From", default)]
    from: String,
    #[serde(rename = "Digits")]
    digits: Option<String>,
    #[serde(rename = "SpeechResult")]
    speech_result: Option<String>,
    #[serde(rename = "Confidence")]
    confidence: Option<String>,
    #[serde(rename = "RecordingSid")]
    recording_sid: Option<String>,
    #[serde(rename = "RecordingUrl")]
    recording_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<CallForm> for InboundEvent {
    fn from(form: CallForm) -> Self {
        Self {
            call_id: form.call_sid,
            caller_id: form.from,
            digits: non_blank(form.digits),
            speech_transcript: non_blank(form.speech_result),
            speech_confidence: form
                .confidence
                .and_then(|c| c.trim().parse::<f32>().ok())
                .filter(|c| c.is_finite()),
            recording_id: non_blank(form.recording_sid),
            recording_url: non_blank(form.recording_url),
        }
    }
}

/// `?q_index=` on the ask-question webhook. Unparseable values are ignored.
#[derive(Debug, Default, Deserialize)]
struct AskParams {
    q_index: Option<String>,
}

impl AskParams {
    fn index(&self) -> Option<i64> {
        self.q_index.as_deref()?.trim().parse().ok()
    }
}

fn twiml(state: &VoiceState, directive: &Directive) -> Response {
    let xml = state.renderer.render(directive);
    debug!(twiml = %xml, "Outgoing TwiML");
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

/// Build the voice webhook router.
pub fn voice_routes(state: VoiceState) -> Router {
    Router::new()
        .route("/voice", post(voice))
        .route("/set_language", post(set_language))
        .route("/ask_question", post(ask_question))
        .route("/skip_question", post(skip_question))
        .route("/handle_answer", post(handle_answer))
        .route("/handle_recording_fallback", post(handle_recording_fallback))
        .route("/health", get(health))
        .route("/api/sessions", get(list_sessions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `port` on all interfaces and serve until ctrl-c.
pub async fn serve(state: VoiceState, port: u16) -> Result<()> {
    let app = voice_routes(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port = port, "Voice webhook server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

// ── Webhooks ────────────────────────────────────────────────────────────

async fn voice(State(state): State<VoiceState>, Form(form): Form<CallForm>) -> impl IntoResponse {
    let directive = state.engine.on_call_start(&form.into()).await;
    twiml(&state, &directive)
}

async fn set_language(
    State(state): State<VoiceState>,
    Form(form): Form<CallForm>,
) -> impl IntoResponse {
    let directive = state.engine.on_language_selected(&form.into()).await;
    twiml(&state, &directive)
}

async fn ask_question(
    State(state): State<VoiceState>,
    Query(params): Query<AskParams>,
    Form(form): Form<CallForm>,
) -> impl IntoResponse {
    let directive = state.engine.ask_question(&form.into(), params.index()).await;
    twiml(&state, &directive)
}

async fn skip_question(
    State(state): State<VoiceState>,
    Form(form): Form<CallForm>,
) -> impl IntoResponse {
    let directive = state.engine.on_no_input(&form.into()).await;
    twiml(&state, &directive)
}

async fn handle_answer(
    State(state): State<VoiceState>,
    Form(form): Form<CallForm>,
) -> impl IntoResponse {
    let directive = state.engine.on_answer(&form.into()).await;
    twiml(&state, &directive)
}

async fn handle_recording_fallback(
    State(state): State<VoiceState>,
    Form(form): Form<CallForm>,
) -> impl IntoResponse {
    let directive = state.engine.on_recording(&form.into()).await;
    twiml(&state, &directive)
}

// ── Status ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "career-buddy"
    }))
}

async fn list_sessions(State(state): State<VoiceState>) -> impl IntoResponse {
    let sessions = state.engine.store().summaries().await;
    Json(serde_json::json!({
        "count": sessions.len(),
        "sessions": sessions,
    }))
}
