//! Career recommendation.
//!
//! The AI path asks for two or three suggestions built from every recorded
//! answer. The rule-based path scores transcripts against fixed keyword sets
//! and renders suggestions from a fixed table. Keywords match at the start of
//! a word, case-insensitively, so "drawing" counts for `draw` and "start"
//! does not count for `art`. Placeholder transcripts are never scored.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::dialog::recorder::is_placeholder;
use crate::dialog::{Answer, Language, Session, WORK_STYLE_QUESTION_ID};
use crate::llm::{AiResult, CooldownGate, TextService, generate_bounded};

/// Maximum number of rule-based suggestions.
const MAX_SUGGESTIONS: usize = 3;

struct Suggestion {
    title: &'static str,
    reason: &'static str,
    next_step: &'static str,
}

struct KeywordRule {
    keywords: &'static [&'static str],
    suggestion: Suggestion,
}

const RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &[
            "math",
            "physics",
            "computer",
            "coding",
            "electronics",
            "engineer",
            "mechanical",
            "civil",
            "electrical",
        ],
        suggestion: Suggestion {
            title: "Engineering (Computer/IT/Mech)",
            reason: "Good at logical thinking & maths.",
            next_step: "focus on maths & physics in 11th; try basic coding.",
        },
    },
    KeywordRule {
        keywords: &["medical", "doctor", "biology", "patient", "nurse", "pharmacy"],
        suggestion: Suggestion {
            title: "Medical / Allied Health",
            reason: "Interest in life sciences and helping people.",
            next_step: "explore Biology in 11th; talk to a local clinic/paramedical course.",
        },
    },
    KeywordRule {
        keywords: &["creative", "draw", "art", "design", "writing"],
        suggestion: Suggestion {
            title: "Design / Creative fields",
            reason: "Strong creative and visual interest.",
            next_step: "build a small portfolio; try art/design classes.",
        },
    },
    KeywordRule {
        keywords: &["hands", "fix", "mechanic", "tools", "practical", "build"],
        suggestion: Suggestion {
            title: "Trades / Diploma (ITI)",
            reason: "Enjoys hands-on practical work.",
            next_step: "look into local ITI or diploma courses.",
        },
    },
];

const GENERIC: &[Suggestion] = &[
    Suggestion {
        title: "Computer/IT (incl. diploma)",
        reason: "Useful technical skills for many jobs.",
        next_step: "start a basic computer or coding course.",
    },
    Suggestion {
        title: "Business / Commerce (B.Com path)",
        reason: "Good if you like practical planning & money.",
        next_step: "consider commerce subjects in 11th.",
    },
];

const ENGINEERING_KEYWORDS: &[&str] = &[
    "engineer",
    "engineering",
    "math",
    "physics",
    "computer",
    "coding",
    "electronics",
    "mechanical",
    "civil",
    "electrical",
];

const MEDICAL_KEYWORDS: &[&str] = &[
    "medical", "medicine", "doctor", "biology", "surgery", "patient", "pharmacy", "nurse",
    "health",
];

/// Broad study track, for internal classification only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Engineering,
    Medical,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Engineering => write!(f, "Engineering"),
            Track::Medical => write!(f, "Medical"),
        }
    }
}

/// Lower-cased words of every scored transcript.
fn scored_words<'a>(answers: impl IntoIterator<Item = &'a Answer>) -> Vec<String> {
    answers
        .into_iter()
        .filter(|a| !is_placeholder(&a.transcript))
        .flat_map(|a| words(&a.transcript))
        .collect()
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn mentions(words: &[String], keyword: &str) -> bool {
    words.iter().any(|w| w.starts_with(keyword))
}

fn hits(words: &[String], keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| mentions(words, k)).count()
}

/// Deterministic recommendation text from keyword hits in the answers.
pub fn rule_based_careers(answers: &[Answer], language: Language) -> String {
    let words = scored_words(answers);

    let mut suggestions: Vec<&Suggestion> = RULES
        .iter()
        .filter(|rule| hits(&words, rule.keywords) > 0)
        .map(|rule| &rule.suggestion)
        .take(MAX_SUGGESTIONS)
        .collect();
    if suggestions.is_empty() {
        suggestions = GENERIC.iter().collect();
    }

    let (lead, next_label) = match language {
        Language::En => ("Suggested career options:", "Next:"),
        Language::Hi => ("आपके लिए सुझाए गए विकल्प:", "अगला कदम:"),
        Language::Gu => ("તમારા માટે સૂચિત વિકલ્પો:", "આગામી પગલું:"),
    };

    let items: Vec<String> = suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            format!(
                "{}) {} — {} {} {}",
                i + 1,
                s.title,
                s.reason,
                next_label,
                s.next_step
            )
        })
        .collect();

    format!("{lead} {}", items.join(" "))
}

/// Classify the caller as leaning engineering or medical.
///
/// An explicit mention in the work-style answer wins outright. Otherwise the
/// track with more distinct keyword hits wins; ties go to engineering.
pub fn likely_track(session: &Session) -> (Track, String) {
    for answer in session
        .answers()
        .iter()
        .filter(|a| a.question_id == WORK_STYLE_QUESTION_ID)
    {
        let words = words(&answer.transcript);
        if mentions(&words, "engineer") {
            return (Track::Engineering, "explicit mention of engineering".to_string());
        }
        if ["medical", "doctor", "medicine"]
            .iter()
            .any(|k| mentions(&words, k))
        {
            return (Track::Medical, "explicit mention of medical".to_string());
        }
    }

    let words = scored_words(session.answers());
    let engineering = hits(&words, ENGINEERING_KEYWORDS);
    let medical = hits(&words, MEDICAL_KEYWORDS);
    if engineering >= medical {
        (
            Track::Engineering,
            format!("engineering-leaning answers ({engineering} vs {medical})"),
        )
    } else {
        (
            Track::Medical,
            format!("medical-leaning answers ({medical} vs {engineering})"),
        )
    }
}

/// Produces the closing recommendation.
pub struct RecommendationEngine {
    service: Option<Arc<dyn TextService>>,
    gate: Arc<CooldownGate>,
    timeout: Duration,
}

impl RecommendationEngine {
    pub fn new(
        service: Option<Arc<dyn TextService>>,
        gate: Arc<CooldownGate>,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            gate,
            timeout,
        }
    }

    /// Recommendation text for this session. Never fails.
    pub async fn final_recommendation(&self, session: &Session, language: Language) -> String {
        let (track, rationale) = likely_track(session);
        info!(
            call_id = %session.call_id,
            answers = session.answers().len(),
            track = %track,
            rationale = %rationale,
            "Preparing recommendation"
        );

        let Some(service) = self.service.as_ref() else {
            return rule_based_careers(session.answers(), language);
        };
        if !self.gate.try_acquire() {
            debug!(call_id = %session.call_id, "AI cooling down, rule-based recommendation");
            return rule_based_careers(session.answers(), language);
        }

        let prompt = prompt(session.answers(), language);
        match generate_bounded(service.as_ref(), &prompt, self.timeout).await {
            AiResult::Success(text) if !text.trim().is_empty() => text.trim().to_string(),
            AiResult::Success(_) => {
                debug!(call_id = %session.call_id, "Empty AI recommendation, using rules");
                rule_based_careers(session.answers(), language)
            }
            AiResult::Failure(error) => {
                self.gate.record_failure(&error);
                rule_based_careers(session.answers(), language)
            }
        }
    }
}

fn prompt(answers: &[Answer], language: Language) -> String {
    let blob = answers
        .iter()
        .map(|a| format!("{}: {}", a.question_id, a.transcript))
        .collect::<Vec<_>>()
        .join("\n");

    match language {
        Language::En => format!(
            "You are a friendly, concise career counselor. The student is in 10th standard. \
             Based on the short answers below, suggest 2 to 3 concrete career paths the student \
             could pursue after 10th. For each suggestion give: (1) career name, (2) a short \
             reason (6-10 words), and (3) one short next step (one sentence). Respond as a \
             numbered list, each item on its own line. Keep the output short and kid-friendly.\
             \n\n{blob}\n\nReply now."
        ),
        Language::Hi => format!(
            "आप एक संक्षिप्त करियर काउंसलर हैं। छात्र 10वीं कक्षा में है। नीचे दिए गए छोटे उत्तरों के आधार \
             पर 2-3 करियर विकल्प सुझाएँ जो 10वीं के बाद चुने जा सकते हैं। प्रत्येक विकल्प के लिए: (1) करियर \
             का नाम, (2) 6-10 शब्दों में कारण, और (3) एक छोटा अगला कदम (एक वाक्य)। नंबरित सूची के रूप में \
             उत्तर दें, प्रत्येक विकल्प अलग लाइन में।\n\n{blob}\n\nउत्तर दें।"
        ),
        Language::Gu => format!(
            "તમે સંક્ષિપ્ત કારકિર્દી સલાહકાર છો. વિદ્યાર્થી 10મા ધોરણમાં છે. નીચેના જવાબો પરથી 2-3 \
             કારકિર્દી વિકલ્પો આપો જે 10મા પછી યોગ્ય હોય. દરેક માટે: (1) કારકિર્દીનું નામ, (2) 6-10 \
             શબ્દોમાં કારણ, અને (3) એક નાનું આગામી પગલું (એક વાક્ય). દરેક વિકલ્પ અલગ લાઇનમાં નંબરવાળી \
             સૂચિ તરીકે આપો.\n\n{blob}\n\nજવાબ આપો."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::recorder::{record_answer, record_no_input, recording_placeholder};
    use crate::dialog::{QuestionCatalog, progression};
    use crate::llm::testing::{FailingService, FixedService};

    fn session_with(answers: &[(&str, &str)]) -> Session {
        let mut session = Session::new("CA1", "+91");
        for (question_id, transcript) in answers {
            record_answer(&mut session, question_id, transcript, Some(0.9));
        }
        session
    }

    #[test]
    fn medical_keywords_yield_only_medical() {
        let session = session_with(&[
            ("q4", "I want to be a doctor"),
            ("q11", "reading about biology"),
        ]);
        let text = rule_based_careers(session.answers(), Language::En);
        assert!(text.starts_with("Suggested career options: 1) Medical / Allied Health"));
        assert!(!text.contains("Engineering"));
        assert!(!text.contains("2)"));
    }

    #[test]
    fn no_keywords_yield_two_generic_suggestions() {
        let catalog = QuestionCatalog::builtin();
        let mut session = Session::new("CA1", "+91");
        session.question_index = 1;
        for i in 1..=18 {
            record_answer(&mut session, &format!("q{i}"), "test", None);
            progression::advance(&mut session, &catalog);
        }
        assert!(progression::is_complete(&session, &catalog));

        let text = rule_based_careers(session.answers(), Language::En);
        assert!(text.contains("1) Computer/IT (incl. diploma)"));
        assert!(text.contains("2) Business / Commerce (B.Com path)"));
        assert!(!text.contains("3)"));
    }

    #[test]
    fn suggestions_are_capped_at_three() {
        let session = session_with(&[
            ("q4", "coding club"),
            ("q8", "drawing and writing"),
            ("q10", "I like to fix things with my hands"),
            ("q16", "health, I want to be a nurse"),
        ]);
        let text = rule_based_careers(session.answers(), Language::En);
        assert!(text.contains("3)"));
        assert!(!text.contains("4)"));
        assert!(!text.contains("Trades"));
    }

    #[test]
    fn keywords_match_word_prefixes_only() {
        let session = session_with(&[("q11", "I start early and love drawing")]);
        let text = rule_based_careers(session.answers(), Language::En);
        assert!(text.contains("Design / Creative fields"));

        let session = session_with(&[("q11", "I start early and smart")]);
        let text = rule_based_careers(session.answers(), Language::En);
        assert!(!text.contains("Design"));
    }

    #[test]
    fn placeholders_are_not_scored() {
        let catalog = QuestionCatalog::builtin();
        let placeholder = recording_placeholder("https://api.example.com/Recordings/RE-art-design");
        let mut session = session_with(&[("q3", placeholder.as_str())]);
        record_no_input(&mut session, &catalog);
        let text = rule_based_careers(session.answers(), Language::En);
        assert!(text.contains("Computer/IT (incl. diploma)"));
    }

    #[test]
    fn rendered_in_caller_language() {
        let session = session_with(&[("q4", "doctor")]);
        let hi = rule_based_careers(session.answers(), Language::Hi);
        assert!(hi.starts_with("आपके लिए सुझाए गए विकल्प:"));
        assert!(hi.contains("अगला कदम:"));
        let gu = rule_based_careers(session.answers(), Language::Gu);
        assert!(gu.starts_with("તમારા માટે સૂચિત વિકલ્પો:"));
        assert!(gu.contains("આગામી પગલું:"));
    }

    #[test]
    fn explicit_engineering_on_work_style_wins() {
        let session = session_with(&[
            ("q2", "Alone, I want to do engineering"),
            ("q4", "a doctor club about biology, medicine and patient health"),
        ]);
        let (track, rationale) = likely_track(&session);
        assert_eq!(track, Track::Engineering);
        assert!(rationale.contains("explicit mention"));
    }

    #[test]
    fn explicit_medical_on_work_style_wins() {
        let session = session_with(&[("q2", "with friends, maybe medical"), ("q6", "math puzzles")]);
        let (track, rationale) = likely_track(&session);
        assert_eq!(track, Track::Medical);
        assert!(rationale.contains("explicit mention"));
    }

    #[test]
    fn track_by_counts_with_ties_to_engineering() {
        let session = session_with(&[("q4", "biology and health"), ("q6", "math")]);
        let (track, rationale) = likely_track(&session);
        assert_eq!(track, Track::Medical);
        assert!(rationale.contains("(2 vs 1)"));

        let session = session_with(&[("q4", "biology"), ("q6", "math")]);
        let (track, rationale) = likely_track(&session);
        assert_eq!(track, Track::Engineering);
        assert!(rationale.contains("(1 vs 1)"));
    }

    #[tokio::test]
    async fn ai_recommendation_is_used_when_available() {
        let service = FixedService::new("\n1) Engineering - good at maths\n");
        let engine = RecommendationEngine::new(
            Some(service.clone()),
            Arc::new(CooldownGate::new()),
            Duration::from_secs(1),
        );
        let session = session_with(&[("q6", "math")]);
        let text = engine.final_recommendation(&session, Language::En).await;
        assert_eq!(text, "1) Engineering - good at maths");
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn ai_failure_sets_cooldown_and_falls_back() {
        let gate = Arc::new(CooldownGate::new());
        let engine = RecommendationEngine::new(
            Some(Arc::new(FailingService {
                body: "quota exceeded, retry in 45 seconds".to_string(),
            })),
            Arc::clone(&gate),
            Duration::from_secs(1),
        );
        let session = session_with(&[("q4", "doctor")]);

        let before = chrono::Utc::now();
        let text = engine.final_recommendation(&session, Language::En).await;
        assert!(text.contains("Medical / Allied Health"));

        let until = gate.disabled_until().unwrap();
        let delay = until - before;
        assert!(delay >= chrono::Duration::seconds(47));
        assert!(delay < chrono::Duration::seconds(49));
    }

    #[tokio::test]
    async fn empty_ai_reply_falls_back_without_cooldown() {
        let gate = Arc::new(CooldownGate::new());
        let engine = RecommendationEngine::new(
            Some(FixedService::new("   ")),
            Arc::clone(&gate),
            Duration::from_secs(1),
        );
        let session = session_with(&[("q1", "test")]);
        let text = engine.final_recommendation(&session, Language::En).await;
        assert!(text.contains("Business / Commerce"));
        assert!(gate.disabled_until().is_none());
    }

    #[tokio::test]
    async fn cooling_down_skips_service() {
        let service = FixedService::new("AI text");
        let gate = Arc::new(CooldownGate::new());
        gate.record_failure("429");
        let engine =
            RecommendationEngine::new(Some(service.clone()), gate, Duration::from_secs(1));
        let session = session_with(&[("q1", "test")]);
        let text = engine.final_recommendation(&session, Language::En).await;
        assert!(text.starts_with("Suggested career options:"));
        assert_eq!(service.calls(), 0);
    }

    #[test]
    fn prompt_embeds_answers_in_order() {
        let session = session_with(&[("q1", "Ravi"), ("q2", "alone")]);
        let text = prompt(session.answers(), Language::En);
        assert!(text.contains("q1: Ravi\nq2: alone"));
    }
}
