//! Question pointer progression.
//!
//! The pointer only ever moves forward by one through `advance`, and is
//! clamped to the terminal index. External pointer values go through `seek`,
//! which clamps instead of failing.

use super::catalog::{Question, QuestionCatalog};
use super::session::Session;

/// What the dialog should do at the session's current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAction {
    /// Ask the question at this index.
    Ask(usize),
    /// Terminal question reached; produce the recommendation.
    Finish,
}

/// Move the pointer forward by one, never past the terminal question.
pub fn advance(session: &mut Session, catalog: &QuestionCatalog) {
    session.question_index = session
        .question_index
        .saturating_add(1)
        .min(catalog.terminal_index());
}

/// The question at the session's pointer, clamping an out-of-range pointer.
pub fn current_question<'a>(session: &Session, catalog: &'a QuestionCatalog) -> &'a Question {
    catalog.at(session.question_index)
}

/// Place the pointer at an externally supplied index, clamped into range.
pub fn seek(session: &mut Session, catalog: &QuestionCatalog, index: i64) -> usize {
    session.question_index = catalog.clamp_index(index);
    session.question_index
}

/// Pull a stored pointer back into range if something corrupted it.
pub fn normalize(session: &mut Session, catalog: &QuestionCatalog) -> usize {
    session.question_index = session.question_index.min(catalog.terminal_index());
    session.question_index
}

pub fn is_complete(session: &Session, catalog: &QuestionCatalog) -> bool {
    catalog.is_terminal_index(session.question_index)
}

pub fn next_action(session: &Session, catalog: &QuestionCatalog) -> NextAction {
    if is_complete(session, catalog) {
        NextAction::Finish
    } else {
        NextAction::Ask(session.question_index)
    }
}
