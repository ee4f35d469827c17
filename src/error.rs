//! Error types for Career Buddy.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// AI text service errors.
///
/// The `Display` output of every variant includes whatever the provider said,
/// because the cooldown heuristic reads retry hints out of it.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited (429): {body}")]
    RateLimited { provider: String, body: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {ms}ms", ms = .timeout.as_millis())]
    Timeout { provider: String, timeout: Duration },
}

/// Faults raised while preparing the next caller prompt.
///
/// These never reach the transport; the dialog engine recovers from them.
#[derive(Debug, thiserror::Error)]
pub enum DialogError {
    #[error("Question {question_id} has no text for language {language}")]
    MissingQuestionText { question_id: String, language: String },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
