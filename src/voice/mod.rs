//! Telephony boundary.
//!
//! The voice platform posts one [`InboundEvent`] per call turn and expects a
//! [`Directive`] back: speak some text, then either capture input, move to
//! another webhook, or hang up. [`twiml`] renders directives as TwiML and
//! [`routes`] exposes the webhooks.

pub mod routes;
pub mod twiml;

use crate::dialog::Language;

/// One call turn as delivered by the voice platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundEvent {
    pub call_id: String,
    pub caller_id: String,
    pub digits: Option<String>,
    pub speech_transcript: Option<String>,
    pub speech_confidence: Option<f32>,
    pub recording_id: Option<String>,
    pub recording_url: Option<String>,
}

impl InboundEvent {
    pub fn new(call_id: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            caller_id: caller_id.into(),
            ..Self::default()
        }
    }
}

/// Webhooks the platform is sent back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SetLanguage,
    AskQuestion(usize),
    SkipQuestion,
    HandleAnswer,
}

impl Route {
    /// Path and query, relative to the public base URL.
    pub fn path(&self) -> String {
        match self {
            Route::SetLanguage => "/set_language".to_string(),
            Route::AskQuestion(index) => format!("/ask_question?q_index={index}"),
            Route::SkipQuestion => "/skip_question".to_string(),
            Route::HandleAnswer => "/handle_answer".to_string(),
        }
    }
}

/// Something spoken before the directive's final action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Say(String),
    /// Silence, in seconds.
    Pause(u32),
}

/// How a directive ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Then {
    /// Speak `prompt` while listening for speech, post the result to `action`.
    CaptureSpeech {
        prompt: Vec<String>,
        action: Route,
        on_timeout: Route,
    },
    /// Speak `prompt` while listening for keypad digits.
    CaptureDigits {
        prompt: Vec<String>,
        num_digits: u32,
        action: Route,
        on_timeout: Route,
    },
    Redirect(Route),
    Hangup,
}

/// Response to one inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Voice and recognition language for everything in the directive.
    pub language: Language,
    pub steps: Vec<Step>,
    pub then: Then,
}

impl Directive {
    pub fn new(language: Language, then: Then) -> Self {
        Self {
            language,
            steps: Vec::new(),
            then,
        }
    }

    pub fn say(mut self, text: impl Into<String>) -> Self {
        self.steps.push(Step::Say(text.into()));
        self
    }

    pub fn pause(mut self, seconds: u32) -> Self {
        self.steps.push(Step::Pause(seconds));
        self
    }

    /// All text this directive speaks, in order.
    pub fn spoken(&self) -> Vec<&str> {
        let steps = self.steps.iter().filter_map(|s| match s {
            Step::Say(text) => Some(text.as_str()),
            Step::Pause(_) => None,
        });
        let prompt = match &self.then {
            Then::CaptureSpeech { prompt, .. } | Then::CaptureDigits { prompt, .. } => {
                prompt.as_slice()
            }
            Then::Redirect(_) | Then::Hangup => &[],
        };
        steps.chain(prompt.iter().map(String::as_str)).collect()
    }
}
