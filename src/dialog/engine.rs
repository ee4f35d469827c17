//! DialogEngine: turns call events into voice directives.
//!
//! Every handler locks the caller's session for the whole turn, so recording
//! an answer and advancing the pointer happen together. Handlers never fail:
//! a fault while preparing a question is logged, the pointer is advanced, and
//! the caller is sent on to the next question.

use std::sync::Arc;

use tracing::{error, info};

use super::catalog::{LANGUAGE_QUESTION_ID, Language, QuestionCatalog};
use super::progression::{self, NextAction};
use super::recorder;
use super::session::{Session, SessionHandle, SessionStore};
use crate::advisor::{AckGenerator, RecommendationEngine};
use crate::error::DialogError;
use crate::speech;
use crate::voice::{Directive, InboundEvent, Route, Step, Then};

const GREETING: &str = "Hello. I am Career Buddy. Please pick a language by pressing a button.";
const LANGUAGE_MENU: [&str; 3] = [
    "Press 1 for English.",
    "Press 2 for Hindi.",
    "Press 3 for Gujarati.",
];
const LANGUAGE_NOT_DETECTED: &str = "Could not detect language. Defaulting to English.";

fn language_confirmation(language: Language) -> &'static str {
    match language {
        Language::En => "Great, continuing in English.",
        Language::Hi => "ठीक है, अब मैं हिंदी में पूछूंगा।",
        Language::Gu => "સારું, હવે હું ગુજરાતીમાં પૂછીશ.",
    }
}

fn apology(language: Language) -> &'static str {
    match language {
        Language::En => "Thanks. Could not prepare a suggestion right now.",
        Language::Hi => "धन्यवाद। अभी सुझाव तैयार नहीं हो सका।",
        Language::Gu => "આભાર. અત્યારે સૂચન તૈયાર થઈ શક્યું નહીં.",
    }
}

/// Coordinates sessions, the catalog, acknowledgements and recommendations.
pub struct DialogEngine {
    store: Arc<SessionStore>,
    catalog: Arc<QuestionCatalog>,
    acks: AckGenerator,
    recommender: RecommendationEngine,
    chunk_max_len: usize,
}

impl DialogEngine {
    pub fn new(
        store: Arc<SessionStore>,
        catalog: Arc<QuestionCatalog>,
        acks: AckGenerator,
        recommender: RecommendationEngine,
        chunk_max_len: usize,
    ) -> Self {
        Self {
            store,
            catalog,
            acks,
            recommender,
            chunk_max_len: chunk_max_len.max(1),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    async fn session(&self, event: &InboundEvent) -> SessionHandle {
        self.store
            .get_or_create(&event.call_id, &event.caller_id)
            .await
    }

    /// A call was answered: greet and offer the language menu.
    pub async fn on_call_start(&self, event: &InboundEvent) -> Directive {
        let handle = self.session(event).await;
        let mut session = handle.lock().await;
        session.touch();
        info!(call_id = %session.call_id, caller_id = %session.caller_id, "Call started");

        Directive::new(
            Language::En,
            Then::CaptureDigits {
                prompt: LANGUAGE_MENU.iter().map(|s| s.to_string()).collect(),
                num_digits: 1,
                action: Route::SetLanguage,
                on_timeout: Route::SkipQuestion,
            },
        )
        .say(GREETING)
        .pause(1)
    }

    /// The caller pressed a key on the language menu.
    pub async fn on_language_selected(&self, event: &InboundEvent) -> Directive {
        let handle = self.session(event).await;
        let mut session = handle.lock().await;
        session.touch();

        let chosen = event.digits.as_deref().and_then(Language::from_digits);
        let confirmation = match chosen {
            Some(language) => {
                session.language = language;
                language_confirmation(language)
            }
            None => {
                session.language = Language::En;
                LANGUAGE_NOT_DETECTED
            }
        };
        info!(
            call_id = %session.call_id,
            digits = ?event.digits,
            language = %session.language,
            "Language selected"
        );

        let first = self
            .catalog
            .position_of(LANGUAGE_QUESTION_ID)
            .map_or(0, |i| i + 1);
        progression::seek(&mut session, &self.catalog, first as i64);

        self.prompt_current(&mut session, vec![Step::Say(confirmation.to_string())])
            .await
    }

    /// Ask the current question, or finish the call at the terminal question.
    ///
    /// `requested` is the pointer carried in the callback URL; it is clamped
    /// into range and written to the session. Without it the stored pointer
    /// is used.
    pub async fn ask_question(&self, event: &InboundEvent, requested: Option<i64>) -> Directive {
        let handle = self.session(event).await;
        let mut session = handle.lock().await;
        session.touch();

        match requested {
            Some(index) => {
                progression::seek(&mut session, &self.catalog, index);
            }
            None => {
                progression::normalize(&mut session, &self.catalog);
            }
        }

        self.prompt_current(&mut session, Vec::new()).await
    }

    /// Speech was captured for the current question.
    pub async fn on_answer(&self, event: &InboundEvent) -> Directive {
        let handle = self.session(event).await;
        let mut session = handle.lock().await;
        progression::normalize(&mut session, &self.catalog);

        let question_id = progression::current_question(&session, &self.catalog)
            .id
            .clone();
        recorder::record_answer(
            &mut session,
            &question_id,
            event.speech_transcript.as_deref().unwrap_or_default(),
            event.speech_confidence,
        );
        let transcript = session
            .answers()
            .last()
            .map(|a| a.transcript.clone())
            .unwrap_or_default();

        let ack = self
            .acks
            .ack(&transcript, session.language, session.answers().len())
            .await;

        progression::advance(&mut session, &self.catalog);
        Directive::new(
            session.language,
            Then::Redirect(Route::AskQuestion(session.question_index)),
        )
        .say(ack)
        .pause(1)
    }

    /// The capture window closed without speech.
    pub async fn on_no_input(&self, event: &InboundEvent) -> Directive {
        let handle = self.session(event).await;
        let mut session = handle.lock().await;
        progression::normalize(&mut session, &self.catalog);

        recorder::record_no_input(&mut session, &self.catalog);
        progression::advance(&mut session, &self.catalog);

        Directive::new(
            session.language,
            Then::Redirect(Route::AskQuestion(session.question_index)),
        )
    }

    /// A raw recording arrived instead of a transcript.
    ///
    /// A recording that was already processed is absorbed: nothing is
    /// recorded and the caller returns to the current question.
    pub async fn on_recording(&self, event: &InboundEvent) -> Directive {
        let handle = self.session(event).await;
        let mut session = handle.lock().await;
        session.touch();
        progression::normalize(&mut session, &self.catalog);

        let recording_ref = event
            .recording_url
            .as_deref()
            .or(event.recording_id.as_deref())
            .unwrap_or("unknown");
        let appended = recorder::record_fallback_answer(
            &self.store,
            &mut session,
            &self.catalog,
            event.recording_id.as_deref(),
            recording_ref,
        )
        .await;
        if appended {
            progression::advance(&mut session, &self.catalog);
        }

        Directive::new(
            session.language,
            Then::Redirect(Route::AskQuestion(session.question_index)),
        )
    }

    async fn prompt_current(&self, session: &mut Session, steps: Vec<Step>) -> Directive {
        let index = match progression::next_action(session, &self.catalog) {
            NextAction::Finish => return self.finish(session, steps).await,
            NextAction::Ask(index) => index,
        };

        match self.catalog.at(index).text_for(session.language) {
            Ok(text) => Directive {
                language: session.language,
                steps,
                then: Then::CaptureSpeech {
                    prompt: vec![text.to_string()],
                    action: Route::HandleAnswer,
                    on_timeout: Route::SkipQuestion,
                },
            },
            Err(e) => self.recover(session, steps, e),
        }
    }

    fn recover(&self, session: &mut Session, steps: Vec<Step>, error: DialogError) -> Directive {
        let failed_index = session.question_index;
        progression::advance(session, &self.catalog);
        error!(
            call_id = %session.call_id,
            question_index = failed_index,
            next_index = session.question_index,
            error = %error,
            "Could not prepare question, moving on"
        );
        Directive {
            language: session.language,
            steps,
            then: Then::Redirect(Route::AskQuestion(session.question_index)),
        }
    }

    async fn finish(&self, session: &Session, mut steps: Vec<Step>) -> Directive {
        let language = session.language;
        if let Ok(text) = self.catalog.terminal().text_for(language) {
            steps.push(Step::Say(text.to_string()));
        }

        let text = self
            .recommender
            .final_recommendation(session, language)
            .await;
        let mut chunks = speech::chunk(&text, self.chunk_max_len);
        if chunks.is_empty() {
            chunks.push(apology(language).to_string());
        }

        info!(
            call_id = %session.call_id,
            answers = session.answers().len(),
            segments = chunks.len(),
            "Call complete"
        );

        for chunk in chunks {
            steps.push(Step::Say(chunk));
            steps.push(Step::Pause(1));
        }
        Directive {
            language,
            steps,
            then: Then::Hangup,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::dialog::NO_SPEECH_SENTINEL;
    use crate::llm::testing::FixedService;
    use crate::llm::{CooldownGate, TextService};

    fn engine_with(service: Option<Arc<dyn TextService>>) -> DialogEngine {
        let gate = Arc::new(CooldownGate::new());
        DialogEngine::new(
            SessionStore::new(100),
            Arc::new(QuestionCatalog::builtin()),
            AckGenerator::new(service.clone(), Arc::clone(&gate), false, Duration::from_secs(1)),
            RecommendationEngine::new(service, gate, Duration::from_secs(1)),
            160,
        )
    }

    fn engine() -> DialogEngine {
        engine_with(None)
    }

    fn event() -> InboundEvent {
        InboundEvent::new("CA100", "+919800000000")
    }

    fn with_digits(digits: &str) -> InboundEvent {
        InboundEvent {
            digits: Some(digits.to_string()),
            ..event()
        }
    }

    fn with_speech(text: &str) -> InboundEvent {
        InboundEvent {
            speech_transcript: Some(text.to_string()),
            speech_confidence: Some(0.9),
            ..event()
        }
    }

    fn with_recording(id: &str) -> InboundEvent {
        InboundEvent {
            recording_id: Some(id.to_string()),
            recording_url: Some(format!("https://api.example.com/Recordings/{id}")),
            ..event()
        }
    }

    async fn snapshot(engine: &DialogEngine) -> Session {
        let handle = engine.store().get_or_create("CA100", "+919800000000").await;
        let session = handle.lock().await;
        session.clone()
    }

    #[tokio::test]
    async fn call_start_offers_language_menu() {
        let engine = engine();
        let directive = engine.on_call_start(&event()).await;

        assert_eq!(directive.language, Language::En);
        assert_eq!(directive.steps[0], Step::Say(GREETING.to_string()));
        match directive.then {
            Then::CaptureDigits {
                prompt,
                num_digits,
                action,
                on_timeout,
            } => {
                assert_eq!(prompt.len(), 3);
                assert_eq!(num_digits, 1);
                assert_eq!(action, Route::SetLanguage);
                assert_eq!(on_timeout, Route::SkipQuestion);
            }
            other => panic!("expected digit capture, got {other:?}"),
        }
        assert_eq!(engine.store().len().await, 1);
    }

    #[tokio::test]
    async fn language_selection_asks_first_question_in_language() {
        let engine = engine();
        let directive = engine.on_language_selected(&with_digits("2")).await;

        assert_eq!(directive.language, Language::Hi);
        assert_eq!(
            directive.steps,
            vec![Step::Say(language_confirmation(Language::Hi).to_string())]
        );
        let q1 = engine.catalog().at(1).text_for(Language::Hi).unwrap();
        assert_eq!(
            directive.then,
            Then::CaptureSpeech {
                prompt: vec![q1.to_string()],
                action: Route::HandleAnswer,
                on_timeout: Route::SkipQuestion,
            }
        );

        let session = snapshot(&engine).await;
        assert_eq!(session.language, Language::Hi);
        assert_eq!(session.question_index, 1);
    }

    #[tokio::test]
    async fn unknown_digit_defaults_to_english() {
        let engine = engine();
        let directive = engine.on_language_selected(&with_digits("9")).await;
        assert_eq!(directive.language, Language::En);
        assert_eq!(directive.spoken()[0], LANGUAGE_NOT_DETECTED);
    }

    #[tokio::test]
    async fn answer_is_recorded_acknowledged_and_advanced() {
        let engine = engine();
        engine.on_language_selected(&with_digits("1")).await;
        let directive = engine.on_answer(&with_speech("My name is Ravi")).await;

        assert_eq!(
            directive.steps,
            vec![Step::Say("Got it.".to_string()), Step::Pause(1)]
        );
        assert_eq!(directive.then, Then::Redirect(Route::AskQuestion(2)));

        let session = snapshot(&engine).await;
        assert_eq!(session.answers()[0].question_id, "q1");
        assert_eq!(session.answers()[0].transcript, "My name is Ravi");
        assert_eq!(session.question_index, 2);
    }

    #[tokio::test]
    async fn no_input_records_sentinel_and_advances() {
        let engine = engine();
        engine.on_language_selected(&with_digits("1")).await;
        let directive = engine.on_no_input(&event()).await;

        assert_eq!(directive.then, Then::Redirect(Route::AskQuestion(2)));
        let session = snapshot(&engine).await;
        assert_eq!(session.answers()[0].transcript, NO_SPEECH_SENTINEL);
    }

    #[tokio::test]
    async fn missing_language_menu_input_moves_to_first_question() {
        let engine = engine();
        engine.on_call_start(&event()).await;
        let directive = engine.on_no_input(&event()).await;
        assert_eq!(directive.then, Then::Redirect(Route::AskQuestion(1)));
    }

    #[tokio::test]
    async fn duplicate_recording_is_absorbed() {
        let engine = engine();
        engine.on_language_selected(&with_digits("1")).await;

        let first = engine.on_recording(&with_recording("RE1")).await;
        assert_eq!(first.then, Then::Redirect(Route::AskQuestion(2)));
        let second = engine.on_recording(&with_recording("RE1")).await;
        assert_eq!(second.then, Then::Redirect(Route::AskQuestion(2)));

        let session = snapshot(&engine).await;
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.question_index, 2);
    }

    #[tokio::test]
    async fn question_without_text_is_skipped() {
        let engine = engine();
        let directive = engine.ask_question(&event(), Some(0)).await;

        assert_eq!(directive.then, Then::Redirect(Route::AskQuestion(1)));
        assert_eq!(snapshot(&engine).await.question_index, 1);
    }

    #[tokio::test]
    async fn requested_index_is_clamped_and_finishes() {
        let engine = engine();
        let directive = engine.ask_question(&event(), Some(999)).await;

        assert_eq!(directive.then, Then::Hangup);
        assert_eq!(
            snapshot(&engine).await.question_index,
            engine.catalog().terminal_index()
        );
        assert_eq!(directive.steps.last(), Some(&Step::Pause(1)));
    }

    #[tokio::test]
    async fn full_call_without_keywords_ends_with_generic_suggestions() {
        let engine = engine();
        engine.on_call_start(&event()).await;
        engine.on_language_selected(&with_digits("1")).await;

        let mut directive = engine.ask_question(&event(), None).await;
        let mut turns = 0;
        while directive.then != Then::Hangup {
            assert!(turns < 100, "dialog did not terminate");
            directive = match directive.then {
                Then::CaptureSpeech { .. } => engine.on_answer(&with_speech("test")).await,
                Then::Redirect(Route::AskQuestion(index)) => {
                    engine.ask_question(&event(), Some(index as i64)).await
                }
                other => panic!("unexpected {other:?}"),
            };
            turns += 1;
        }

        let session = snapshot(&engine).await;
        assert_eq!(session.answers().len(), 18);
        let spoken = directive.spoken().join(" ");
        assert!(spoken.contains("Computer/IT (incl. diploma)"));
        assert!(spoken.contains("Business / Commerce (B.Com path)"));
        assert!(directive.spoken().iter().all(|s| s.chars().count() <= 160));
    }

    #[tokio::test]
    async fn unspeakable_recommendation_becomes_apology() {
        let engine = engine_with(Some(FixedService::new("** ** ``")));
        let directive = engine.ask_question(&event(), Some(999)).await;
        assert!(directive.spoken().contains(&apology(Language::En)));
        assert_eq!(directive.then, Then::Hangup);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_answers_each_take_one_turn() {
        let engine = Arc::new(engine());
        engine.on_language_selected(&with_digits("1")).await;

        let turns: Vec<_> = (0..5)
            .map(|i| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.on_answer(&with_speech(&format!("answer {i}"))).await })
            })
            .collect();

        let mut targets = Vec::new();
        for turn in turns {
            match turn.await.unwrap().then {
                Then::Redirect(Route::AskQuestion(index)) => targets.push(index),
                other => panic!("unexpected directive end: {other:?}"),
            }
        }
        targets.sort_unstable();
        assert_eq!(targets, vec![2, 3, 4, 5, 6]);

        let session = snapshot(&engine).await;
        assert_eq!(session.question_index, 6);
        let ids: Vec<&str> = session.answers().iter().map(|a| a.question_id.as_str()).collect();
        assert_eq!(ids, ["q1", "q2", "q3", "q4", "q5"]);
    }
}
