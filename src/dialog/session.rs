//! In-memory per-call session state with idle reaping.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::catalog::Language;

/// One recorded answer. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question_id: String,
    /// Never empty; absence of speech is recorded as a sentinel.
    pub transcript: String,
    pub confidence: Option<f32>,
    pub source_recording_id: Option<String>,
}

/// Per-call dialog state.
#[derive(Debug, Clone)]
pub struct Session {
    pub call_id: String,
    pub caller_id: String,
    pub language: Language,
    /// Pointer into the question catalog.
    pub question_index: usize,
    answers: Vec<Answer>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(call_id: impl Into<String>, caller_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            call_id: call_id.into(),
            caller_id: caller_id.into(),
            language: Language::default(),
            question_index: 0,
            answers: Vec::new(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Recorded answers in order.
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub(crate) fn push_answer(&mut self, answer: Answer) {
        self.answers.push(answer);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// Shared, lockable handle to a session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Read-only snapshot of a session, for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub call_id: String,
    pub language: Language,
    pub question_index: usize,
    pub answers: usize,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            call_id: session.call_id.clone(),
            language: session.language,
            question_index: session.question_index,
            answers: session.answers.len(),
            created_at: session.created_at,
            last_activity: session.last_activity,
        }
    }
}

/// Process-wide session table plus the set of processed recording ids.
///
/// The map lock is held only for lookup-or-insert; callers lock the
/// returned session for the duration of a turn.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    processed_recordings: Mutex<HashSet<String>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            processed_recordings: Mutex::new(HashSet::new()),
            max_sessions: max_sessions.max(1),
        })
    }

    /// Return the session for `call_id`, creating it on first contact.
    pub async fn get_or_create(&self, call_id: &str, caller_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(call_id) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write().await;
        if let Some(handle) = sessions.get(call_id) {
            return Arc::clone(handle);
        }

        if sessions.len() >= self.max_sessions {
            evict_least_recent(&mut sessions);
        }

        info!(call_id = %call_id, caller_id = %caller_id, "Session created");
        let handle = Arc::new(Mutex::new(Session::new(call_id, caller_id)));
        sessions.insert(call_id.to_string(), Arc::clone(&handle));
        handle
    }

    /// Record a recording id as processed.
    ///
    /// Returns `false` if it was already present. Ids are never removed.
    pub async fn mark_recording_processed(&self, recording_id: &str) -> bool {
        self.processed_recordings
            .lock()
            .await
            .insert(recording_id.to_string())
    }

    /// Visit every session that is not currently locked by a turn.
    pub async fn for_each_active<F>(&self, mut visit: F)
    where
        F: FnMut(&Session),
    {
        let sessions = self.sessions.read().await;
        for handle in sessions.values() {
            if let Ok(session) = handle.try_lock() {
                visit(&session);
            }
        }
    }

    /// Snapshot of every idle session.
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let mut out = Vec::new();
        self.for_each_active(|s| out.push(SessionSummary::from(s)))
            .await;
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        out
    }

    /// Drop sessions whose last activity is older than `idle`.
    /// Sessions locked by an in-flight turn are skipped.
    pub async fn reap_idle(&self, now: DateTime<Utc>, idle: Duration) -> usize {
        let idle =
            chrono::Duration::from_std(idle).unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|call_id, handle| match handle.try_lock() {
            Ok(session) => {
                let keep = now - session.last_activity < idle;
                if !keep {
                    debug!(call_id = %call_id, "Session reaped");
                }
                keep
            }
            Err(_) => true,
        });
        let reaped = before - sessions.len();
        if reaped > 0 {
            info!(count = reaped, "Reaped idle sessions");
        }
        reaped
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn evict_least_recent(sessions: &mut HashMap<String, SessionHandle>) {
    let victim = sessions
        .iter()
        .filter_map(|(id, handle)| {
            handle
                .try_lock()
                .ok()
                .map(|session| (id.clone(), session.last_activity))
        })
        .min_by_key(|(_, last)| *last)
        .map(|(id, _)| id);

    if let Some(call_id) = victim {
        sessions.remove(&call_id);
        info!(call_id = %call_id, "Session evicted at capacity");
    }
}

/// Spawn a background task that periodically reaps idle sessions.
pub fn spawn_reaper_task(
    store: Arc<SessionStore>,
    interval: Duration,
    idle: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            store.reap_idle(Utc::now(), idle).await;
        }
    })
}
