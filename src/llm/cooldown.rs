//! Process-wide backoff for the AI text service.
//!
//! One external dependency, one rate limit: a single gate is shared by the
//! acknowledgement and recommendation paths. After a failure the gate stays
//! closed for a delay derived from the provider's error text. The parse is a
//! best-effort heuristic over unstructured text, not a provider contract.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use tracing::warn;

/// Added on top of an explicit retry hint.
pub const RETRY_GRACE: Duration = Duration::from_secs(2);

/// Cooldown when the error looks like a quota or rate limit without a hint.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Cooldown for any other failure.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

/// Upper bound on any cooldown, whatever the provider asks for.
pub const MAX_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// `seconds: 45`, `seconds=45` (protobuf-style retry info).
static SECONDS_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)seconds?["']?\s*[:=]\s*(\d+)"#).expect("valid seconds-field regex")
});

/// `45 seconds`, `45s`, `"retryDelay": "45s"`, `12.5 sec`.
static AMOUNT_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:seconds?|secs?|s)\b").expect("valid amount regex")
});

const RATE_LIMIT_MARKERS: &[&str] = &[
    "quota",
    "429",
    "rate limit",
    "rate-limit",
    "ratelimit",
    "resource_exhausted",
    "too many requests",
];

/// Extract an explicit retry delay from provider error text.
pub fn parse_retry_delay(error_text: &str) -> Option<Duration> {
    if let Some(caps) = SECONDS_FIELD.captures(error_text) {
        if let Ok(secs) = caps[1].parse::<u64>() {
            return Some(Duration::from_secs(secs));
        }
    }

    let caps = AMOUNT_WITH_UNIT.captures(error_text)?;
    let secs = caps[1].parse::<f64>().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs(secs.ceil() as u64))
}

/// How long to stay away from the AI service after this failure.
/// Never longer than [`MAX_COOLDOWN`].
pub fn cooldown_for(error_text: &str) -> Duration {
    if let Some(delay) = parse_retry_delay(error_text) {
        return delay.saturating_add(RETRY_GRACE).min(MAX_COOLDOWN);
    }
    let lowered = error_text.to_lowercase();
    if RATE_LIMIT_MARKERS.iter().any(|m| lowered.contains(m)) {
        RATE_LIMIT_COOLDOWN
    } else {
        DEFAULT_COOLDOWN
    }
}

/// Shared "AI disabled until" clock.
///
/// Reads and writes are atomic; two racing callers may both slip through
/// at the moment the gate reopens, which is acceptable.
#[derive(Debug, Default)]
pub struct CooldownGate {
    /// Unix milliseconds; 0 means open.
    disabled_until_ms: AtomicI64,
}

impl CooldownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the AI service may be consulted now.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Utc::now())
    }

    pub fn try_acquire_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.disabled_until_ms.load(Ordering::Acquire)
    }

    /// Close the gate according to the failure text. Returns the reopen time.
    pub fn record_failure(&self, error_text: &str) -> DateTime<Utc> {
        self.record_failure_at(error_text, Utc::now())
    }

    pub fn record_failure_at(&self, error_text: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        let delay = cooldown_for(error_text);
        let until = chrono::Duration::from_std(delay)
            .ok()
            .and_then(|d| now.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.disabled_until_ms
            .store(until.timestamp_millis(), Ordering::Release);
        warn!(
            delay_secs = delay.as_secs(),
            until = %until,
            error = error_text,
            "AI service cooling down"
        );
        until
    }

    /// The reopen time, if the gate has ever been closed.
    pub fn disabled_until(&self) -> Option<DateTime<Utc>> {
        match self.disabled_until_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Utc.timestamp_millis_opt(ms).single(),
        }
    }
}
