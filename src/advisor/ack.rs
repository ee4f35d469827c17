//! Acknowledgement generator.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::dialog::Language;
use crate::llm::{AiResult, CooldownGate, TextService, generate_bounded};
use crate::speech;

const CANNED_EN: &[&str] = &["Thanks, noted.", "Got it.", "Noted."];
const CANNED_HI: &[&str] = &["धन्यवाद, नोट कर लिया।", "ठीक है।"];
const CANNED_GU: &[&str] = &["આભાર, નોંધ્યું.", "બરાબર."];

/// Produces the short phrase spoken after each answer.
pub struct AckGenerator {
    service: Option<Arc<dyn TextService>>,
    gate: Arc<CooldownGate>,
    enabled: bool,
    timeout: Duration,
}

impl AckGenerator {
    /// `enabled` is the feature flag for AI acknowledgements; with it off
    /// (or without a service) every acknowledgement is canned.
    pub fn new(
        service: Option<Arc<dyn TextService>>,
        gate: Arc<CooldownGate>,
        enabled: bool,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            gate,
            enabled,
            timeout,
        }
    }

    /// Canned phrase for this turn. Rotates through the language's list.
    pub fn canned(language: Language, turn: usize) -> &'static str {
        let phrases = match language {
            Language::En => CANNED_EN,
            Language::Hi => CANNED_HI,
            Language::Gu => CANNED_GU,
        };
        phrases[turn % phrases.len()]
    }

    /// Acknowledge `transcript`. Never fails; waits at most one request timeout.
    pub async fn ack(&self, transcript: &str, language: Language, turn: usize) -> String {
        let canned = Self::canned(language, turn);

        let Some(service) = self.service.as_ref().filter(|_| self.enabled) else {
            return canned.to_string();
        };
        if !self.gate.try_acquire() {
            debug!(until = ?self.gate.disabled_until(), "AI cooling down, canned ack");
            return canned.to_string();
        }

        match generate_bounded(service.as_ref(), &prompt(transcript, language), self.timeout).await {
            AiResult::Success(text) => {
                let first_line = text.trim().lines().next().unwrap_or_default();
                let ack = speech::sanitize(first_line);
                if ack.is_empty() {
                    canned.to_string()
                } else {
                    ack
                }
            }
            AiResult::Failure(error) => {
                self.gate.record_failure(&error);
                canned.to_string()
            }
        }
    }
}

fn prompt(transcript: &str, language: Language) -> String {
    match language {
        Language::En => {
            format!("Short acknowledgement (<=6 words) in English for: \"{transcript}\"")
        }
        Language::Hi => {
            format!("'{transcript}' के जवाब के लिए 6 शब्द से कम में एक संक्षिप्त स्वीकृति दें।")
        }
        Language::Gu => {
            format!("\"{transcript}\" માટે 6 શબ્દોથી ઓછી એક ટૂંકી સ્વીકૃતિ આપો.")
        }
    }
}
