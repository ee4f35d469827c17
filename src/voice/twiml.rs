//! TwiML rendering.
//!
//! https://www.twilio.com/docs/voice/twiml

use std::io;
use std::time::Duration;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::error;

use super::{Directive, Route, Step, Then};
use crate::dialog::Language;

/// Served if writing a directive ever fails.
const HANGUP_ONLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response><Hangup/></Response>"#;

/// Renders directives with absolute callback URLs and capture timeouts.
#[derive(Debug, Clone)]
pub struct TwimlRenderer {
    base_url: String,
    gather_timeout: Duration,
    speech_timeout: Duration,
}

impl TwimlRenderer {
    pub fn new(base_url: &str, gather_timeout: Duration, speech_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            gather_timeout,
            speech_timeout,
        }
    }

    pub fn url(&self, route: Route) -> String {
        format!("{}{}", self.base_url, route.path())
    }

    pub fn render(&self, directive: &Directive) -> String {
        let mut writer = Writer::new(Vec::new());
        if let Err(e) = self.write_response(&mut writer, directive) {
            error!(error = %e, "Failed to write TwiML, hanging up");
            return HANGUP_ONLY.to_string();
        }
        String::from_utf8_lossy(&writer.into_inner()).into_owned()
    }

    fn write_response(&self, w: &mut Writer<Vec<u8>>, directive: &Directive) -> io::Result<()> {
        let language = directive.language;
        w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        w.write_event(Event::Start(BytesStart::new("Response")))?;

        for step in &directive.steps {
            match step {
                Step::Say(text) => write_say(w, language, text)?,
                Step::Pause(seconds) => {
                    let length = seconds.to_string();
                    w.write_event(Event::Empty(
                        BytesStart::new("Pause").with_attributes([("length", length.as_str())]),
                    ))?;
                }
            }
        }

        match &directive.then {
            Then::CaptureSpeech {
                prompt,
                action,
                on_timeout,
            } => {
                let action = self.url(*action);
                let timeout = self.gather_timeout.as_secs().to_string();
                let speech_timeout = self.speech_timeout.as_secs().to_string();
                let gather = BytesStart::new("Gather").with_attributes([
                    ("input", "speech"),
                    ("action", action.as_str()),
                    ("method", "POST"),
                    ("timeout", timeout.as_str()),
                    ("speechTimeout", speech_timeout.as_str()),
                    ("language", language.locale()),
                ]);
                write_gather(w, gather, language, prompt)?;
                self.write_redirect(w, *on_timeout)?;
            }
            Then::CaptureDigits {
                prompt,
                num_digits,
                action,
                on_timeout,
            } => {
                let action = self.url(*action);
                let num_digits = num_digits.to_string();
                let timeout = self.gather_timeout.as_secs().to_string();
                let gather = BytesStart::new("Gather").with_attributes([
                    ("input", "dtmf"),
                    ("numDigits", num_digits.as_str()),
                    ("action", action.as_str()),
                    ("method", "POST"),
                    ("timeout", timeout.as_str()),
                ]);
                write_gather(w, gather, language, prompt)?;
                self.write_redirect(w, *on_timeout)?;
            }
            Then::Redirect(route) => self.write_redirect(w, *route)?,
            Then::Hangup => w.write_event(Event::Empty(BytesStart::new("Hangup")))?,
        }

        w.write_event(Event::End(BytesEnd::new("Response")))
    }

    fn write_redirect(&self, w: &mut Writer<Vec<u8>>, route: Route) -> io::Result<()> {
        let url = self.url(route);
        w.write_event(Event::Start(
            BytesStart::new("Redirect").with_attributes([("method", "POST")]),
        ))?;
        w.write_event(Event::Text(BytesText::new(&url)))?;
        w.write_event(Event::End(BytesEnd::new("Redirect")))
    }
}

fn write_gather(
    w: &mut Writer<Vec<u8>>,
    gather: BytesStart<'_>,
    language: Language,
    prompt: &[String],
) -> io::Result<()> {
    w.write_event(Event::Start(gather))?;
    for text in prompt {
        write_say(w, language, text)?;
    }
    w.write_event(Event::End(BytesEnd::new("Gather")))
}

fn write_say(w: &mut Writer<Vec<u8>>, language: Language, text: &str) -> io::Result<()> {
    let text = xml_chars(text);
    w.write_event(Event::Start(BytesStart::new("Say").with_attributes([
        ("voice", language.voice()),
        ("language", language.locale()),
    ])))?;
    w.write_event(Event::Text(BytesText::new(&text)))?;
    w.write_event(Event::End(BytesEnd::new("Say")))
}

/// Drop code points XML 1.0 does not allow in character data.
fn xml_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || matches!(c, '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> TwimlRenderer {
        TwimlRenderer::new(
            "https://buddy.example.com/",
            Duration::from_secs(8),
            Duration::from_secs(3),
        )
    }

    #[test]
    fn speech_gather_with_redirect_on_timeout() {
        let directive = Directive::new(
            Language::Hi,
            Then::CaptureSpeech {
                prompt: vec!["आपका नाम क्या है?".to_string()],
                action: Route::HandleAnswer,
                on_timeout: Route::SkipQuestion,
            },
        )
        .say("ठीक है")
        .pause(1);

        let xml = renderer().render(&directive);
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><Response><Say voice="Google.hi-IN-Wavenet-D" language="hi-IN">ठीक है</Say><Pause length="1"/>"#));
        assert!(xml.contains(r#"<Gather input="speech" action="https://buddy.example.com/handle_answer" method="POST" timeout="8" speechTimeout="3" language="hi-IN">"#));
        assert!(xml.contains("आपका नाम क्या है?</Say></Gather>"));
        assert!(xml.ends_with(r#"<Redirect method="POST">https://buddy.example.com/skip_question</Redirect></Response>"#));
    }

    #[test]
    fn digit_gather() {
        let directive = Directive::new(
            Language::En,
            Then::CaptureDigits {
                prompt: vec!["Press 1 for English.".to_string()],
                num_digits: 1,
                action: Route::SetLanguage,
                on_timeout: Route::SkipQuestion,
            },
        );
        let xml = renderer().render(&directive);
        assert!(xml.contains(r#"<Gather input="dtmf" numDigits="1" action="https://buddy.example.com/set_language" method="POST" timeout="8">"#));
    }

    #[test]
    fn redirect_carries_question_index() {
        let xml = renderer().render(&Directive::new(
            Language::En,
            Then::Redirect(Route::AskQuestion(7)),
        ));
        assert!(xml.contains("https://buddy.example.com/ask_question?q_index=7</Redirect>"));
    }

    #[test]
    fn illegal_code_points_are_dropped() {
        let directive =
            Directive::new(Language::En, Then::Hangup).say("1) Engineering\u{1b}[0m next\u{0}\u{FFFE}");
        let xml = renderer().render(&directive);
        assert!(xml.contains(">1) Engineering[0m next</Say>"));
        assert!(!xml.chars().any(|c| c.is_control()));
    }

    #[test]
    fn hangup_and_escaping() {
        let directive = Directive::new(Language::En, Then::Hangup)
            .say("Maths & physics <b>\"now\"</b>")
            .pause(1);
        let xml = renderer().render(&directive);
        assert!(xml.contains("Maths &amp; physics &lt;b&gt;&quot;now&quot;&lt;/b&gt;"));
        assert!(xml.ends_with("<Pause length=\"1\"/><Hangup/></Response>"));
    }
}
