//! Configuration types.

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default Gemini model used for acknowledgements and recommendations.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Public base URL the voice platform calls back on (no trailing slash).
    pub public_base_url: String,
    /// HTTP listen port.
    pub port: u16,
    /// Gemini API key. `None` runs with rule-based fallbacks only.
    pub gemini_api_key: Option<SecretString>,
    /// Model identifier for the AI text service.
    pub model: String,
    /// Whether acknowledgements may use the AI service at all.
    pub ai_acks_enabled: bool,
    /// Upper bound on every AI request.
    pub ai_timeout: Duration,
    /// Maximum characters per spoken segment.
    pub chunk_max_len: usize,
    /// Sessions idle longer than this are reaped.
    pub session_idle_timeout: Duration,
    /// How often the reaper runs.
    pub reap_interval: Duration,
    /// Session table capacity; the least recently active session is evicted beyond it.
    pub max_sessions: usize,
    /// Capture window for speech and digits.
    pub gather_timeout: Duration,
    /// Trailing silence that ends a speech capture.
    pub speech_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:5000".to_string(),
            port: 5000,
            gemini_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            ai_acks_enabled: false,
            ai_timeout: Duration::from_secs(20),
            chunk_max_len: 160,
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            reap_interval: Duration::from_secs(60),
            max_sessions: 10_000,
            gather_timeout: Duration::from_secs(8),
            speech_timeout: Duration::from_secs(3),
        }
    }
}

impl AppConfig {
    /// Build configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let public_base_url = get("PUBLIC_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("PUBLIC_BASE_URL".to_string()))?
            .trim()
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            public_base_url,
            port: parse_or(&get, "PORT", defaults.port)?,
            gemini_api_key: get("GEMINI_API_KEY").map(SecretString::from),
            model: get("CAREER_BUDDY_MODEL").unwrap_or(defaults.model),
            ai_acks_enabled: parse_bool_or(&get, "CAREER_BUDDY_AI_ACKS", defaults.ai_acks_enabled)?,
            ai_timeout: secs_or(&get, "CAREER_BUDDY_AI_TIMEOUT_SECS", defaults.ai_timeout)?,
            chunk_max_len: parse_or(&get, "CAREER_BUDDY_CHUNK_MAX", defaults.chunk_max_len)?
                .max(1),
            session_idle_timeout: secs_or(
                &get,
                "CAREER_BUDDY_SESSION_IDLE_SECS",
                defaults.session_idle_timeout,
            )?,
            reap_interval: secs_or(&get, "CAREER_BUDDY_REAP_INTERVAL_SECS", defaults.reap_interval)?,
            max_sessions: parse_or(&get, "CAREER_BUDDY_MAX_SESSIONS", defaults.max_sessions)?
                .max(1),
            gather_timeout: secs_or(
                &get,
                "CAREER_BUDDY_GATHER_TIMEOUT_SECS",
                defaults.gather_timeout,
            )?,
            speech_timeout: secs_or(
                &get,
                "CAREER_BUDDY_SPEECH_TIMEOUT_SECS",
                defaults.speech_timeout,
            )?,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn secs_or<G>(get: &G, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default.as_secs()).map(Duration::from_secs)
}

fn parse_bool_or<G>(get: &G, key: &str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got '{other}'"),
            }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_base_url_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "PUBLIC_BASE_URL"));
    }

    #[test]
    fn defaults_apply_when_only_base_url_set() {
        let config =
            AppConfig::from_lookup(lookup(&[("PUBLIC_BASE_URL", "https://abc.ngrok.io/")])).unwrap();
        assert_eq!(config.public_base_url, "https://abc.ngrok.io");
        assert_eq!(config.port, 5000);
        assert!(config.gemini_api_key.is_none());
        assert!(!config.ai_acks_enabled);
        assert_eq!(config.chunk_max_len, 160);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PUBLIC_BASE_URL", "https://x.example"),
            ("PORT", "8088"),
            ("GEMINI_API_KEY", "k-123"),
            ("CAREER_BUDDY_AI_ACKS", "yes"),
            ("CAREER_BUDDY_AI_TIMEOUT_SECS", "5"),
            ("CAREER_BUDDY_MAX_SESSIONS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8088);
        assert_eq!(config.gemini_api_key.unwrap().expose_secret(), "k-123");
        assert!(config.ai_acks_enabled);
        assert_eq!(config.ai_timeout, Duration::from_secs(5));
        assert_eq!(config.max_sessions, 1, "capacity is clamped to at least one");
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = AppConfig::from_lookup(lookup(&[
            ("PUBLIC_BASE_URL", "https://x.example"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));

        let err = AppConfig::from_lookup(lookup(&[
            ("PUBLIC_BASE_URL", "https://x.example"),
            ("CAREER_BUDDY_AI_ACKS", "maybe"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
