//! Answer recording.
//!
//! None of these functions move the question pointer; the caller advances
//! the session afterwards.

use tracing::{debug, info};

use super::catalog::QuestionCatalog;
use super::progression::current_question;
use super::session::{Answer, Session, SessionStore};

/// Transcript recorded when the caller produced no usable speech.
pub const NO_SPEECH_SENTINEL: &str = "(no speech captured)";

/// Prefix of the placeholder transcript for a raw recording.
pub const RECORDING_PLACEHOLDER_PREFIX: &str = "(recording:";

/// Placeholder transcript pointing at a raw recording.
pub fn recording_placeholder(recording_ref: &str) -> String {
    format!("{RECORDING_PLACEHOLDER_PREFIX} {recording_ref})")
}

/// Whether a transcript is one of the placeholders rather than caller speech.
pub fn is_placeholder(transcript: &str) -> bool {
    transcript == NO_SPEECH_SENTINEL || transcript.starts_with(RECORDING_PLACEHOLDER_PREFIX)
}

/// Append a transcribed answer. Blank transcripts become the no-speech sentinel.
pub fn record_answer(
    session: &mut Session,
    question_id: &str,
    transcript: &str,
    confidence: Option<f32>,
) {
    let transcript = transcript.trim();
    let transcript = if transcript.is_empty() {
        NO_SPEECH_SENTINEL
    } else {
        transcript
    };

    debug!(
        call_id = %session.call_id,
        question_id = question_id,
        transcript = transcript,
        confidence = ?confidence,
        "Answer recorded"
    );

    session.push_answer(Answer {
        question_id: question_id.to_string(),
        transcript: transcript.to_string(),
        confidence,
        source_recording_id: None,
    });
}

/// Append the no-speech sentinel for the current question.
pub fn record_no_input(session: &mut Session, catalog: &QuestionCatalog) {
    let question_id = current_question(session, catalog).id.clone();
    info!(call_id = %session.call_id, question_id = %question_id, "No speech captured");
    session.push_answer(Answer {
        question_id,
        transcript: NO_SPEECH_SENTINEL.to_string(),
        confidence: Some(0.0),
        source_recording_id: None,
    });
}

/// Append a placeholder answer for a raw recording, once per recording id.
///
/// Returns `false` when the recording was already processed and nothing was
/// appended. A delivery without a recording id cannot be deduplicated and is
/// always appended.
pub async fn record_fallback_answer(
    store: &SessionStore,
    session: &mut Session,
    catalog: &QuestionCatalog,
    recording_id: Option<&str>,
    recording_ref: &str,
) -> bool {
    if let Some(id) = recording_id {
        if !store.mark_recording_processed(id).await {
            info!(call_id = %session.call_id, recording_id = id, "Recording already processed");
            return false;
        }
    }

    let question_id = current_question(session, catalog).id.clone();
    info!(
        call_id = %session.call_id,
        question_id = %question_id,
        recording_id = ?recording_id,
        "Fallback recording saved"
    );
    session.push_answer(Answer {
        question_id,
        transcript: recording_placeholder(recording_ref),
        confidence: None,
        source_recording_id: recording_id.map(str::to_string),
    });
    true
}
