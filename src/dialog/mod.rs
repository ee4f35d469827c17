//! Call-session dialog engine.
//!
//! A caller walks a fixed question catalog: language selection first, then a
//! battery of aptitude and values questions. Each turn the transport posts a
//! transcript (or a no-input signal) back; the answer is recorded, a short
//! acknowledgement is spoken, and the pointer advances until the terminal
//! question, at which point a career recommendation is produced.

pub mod catalog;
pub mod engine;
pub mod progression;
pub mod recorder;
pub mod session;

pub use catalog::{Language, Question, QuestionCatalog, WORK_STYLE_QUESTION_ID};
pub use engine::DialogEngine;
pub use recorder::NO_SPEECH_SENTINEL;
pub use session::{Answer, Session, SessionHandle, SessionStore, SessionSummary};
