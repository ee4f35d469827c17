//! AI text service integration.
//!
//! The dialog only needs "prompt in, text out". Providers implement
//! [`TextService`]; callers go through [`generate_bounded`] so every request
//! has a deadline, and consult a [`CooldownGate`] before asking at all.

pub mod cooldown;
pub mod gemini;

pub use cooldown::{CooldownGate, cooldown_for, parse_retry_delay};
pub use gemini::GeminiService;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::AiError;

/// Outcome of a single AI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiResult {
    Success(String),
    /// Provider error text, kept verbatim for cooldown parsing.
    Failure(String),
}

impl From<Result<String, AiError>> for AiResult {
    fn from(result: Result<String, AiError>) -> Self {
        match result {
            Ok(text) => Self::Success(text),
            Err(e) => Self::Failure(e.to_string()),
        }
    }
}

/// A free-text generation backend.
#[async_trait]
pub trait TextService: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Generate text for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}

/// Run one request with a hard deadline. A timeout is reported as a failure.
pub async fn generate_bounded(
    service: &dyn TextService,
    prompt: &str,
    timeout: Duration,
) -> AiResult {
    match tokio::time::timeout(timeout, service.generate(prompt)).await {
        Ok(result) => result.into(),
        Err(_) => AiResult::Failure(
            AiError::Timeout {
                provider: service.name().to_string(),
                timeout,
            }
            .to_string(),
        ),
    }
}

/// Configuration for creating the AI text service.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: SecretString,
    pub model: String,
    pub timeout: Duration,
}

/// Create the AI text service from configuration.
pub fn create_service(config: &AiConfig) -> Result<Arc<dyn TextService>, AiError> {
    let service = GeminiService::new(config.api_key.clone(), &config.model, config.timeout)?;
    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Arc::new(service))
}

#[cfg(test)]
pub(crate) mod testing {
    //! Stub services shared by unit tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Always answers with fixed text and counts calls.
    pub struct FixedService {
        pub reply: String,
        pub calls: AtomicUsize,
    }

    impl FixedService {
        pub fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextService for FixedService {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    /// Always fails with the given provider text.
    pub struct FailingService {
        pub body: String,
    }

    #[async_trait]
    impl TextService for FailingService {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            Err(AiError::RateLimited {
                provider: "failing".to_string(),
                body: self.body.clone(),
            })
        }
    }

    /// Never answers.
    pub struct HangingService;

    #[async_trait]
    impl TextService for HangingService {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, AiError> {
            std::future::pending().await
        }
    }
}
