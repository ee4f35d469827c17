//! Google Gemini text service.
//!
//! https://ai.google.dev/api/generate-content

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::TextService;
use crate::error::AiError;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const PROVIDER: &str = "gemini";

/// Gemini `generateContent` client.
pub struct GeminiService {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiService {
    pub fn new(api_key: SecretString, model: &str, timeout: Duration) -> Result<Self, AiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AiError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            api_key,
            model: model.trim_start_matches("models/").to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            timeout,
        })
    }

    /// Point the client at a different API root (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextService for GeminiService {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let resp = match self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&build_request(prompt))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                return Err(AiError::Timeout {
                    provider: PROVIDER.to_string(),
                    timeout: self.timeout,
                });
            }
            Err(e) => {
                return Err(AiError::RequestFailed {
                    provider: PROVIDER.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let status = resp.status();
        let body = resp.text().await.map_err(|e| AiError::RequestFailed {
            provider: PROVIDER.to_string(),
            reason: format!("Failed to read response body: {e}"),
        })?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AiError::RateLimited {
                provider: PROVIDER.to_string(),
                body,
            });
        }
        if !status.is_success() {
            return Err(AiError::RequestFailed {
                provider: PROVIDER.to_string(),
                reason: format!("({status}) {body}"),
            });
        }

        parse_response(&body)
    }
}

fn build_request(prompt: &str) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user".to_string(),
            parts: vec![GeminiPart {
                text: prompt.to_string(),
            }],
        }],
    }
}

fn parse_response(body: &str) -> Result<String, AiError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| AiError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: e.to_string(),
        })?;

    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| AiError::InvalidResponse {
            provider: PROVIDER.to_string(),
            reason: "empty candidates".to_string(),
        })?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect::<String>())
        .unwrap_or_default();

    Ok(text)
}

// ── Gemini API Types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}
