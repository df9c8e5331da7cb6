//! AI tutor — per-user chat sessions seeded by a tutor mode.
//!
//! DESIGN
//! ======
//! A `ChatSession` is an append-only message list that starts with one
//! system message for its mode. Each question appends the user message,
//! sends the whole history to the completer, and appends the reply only on
//! success. A failed exchange leaves the user message in place.
//!
//! Sessions live in a `SessionRegistry` keyed by id, each behind its own
//! mutex, so one user's slow completion never blocks another user. The
//! registry is bounded: idle sessions expire and the least recently used
//! session is evicted at capacity.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::llm::ChatCompleter;
use crate::llm::types::{ChatMessage, LlmError};

// =============================================================================
// MODE
// =============================================================================

/// Conversational stance; selects the session's system instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TutorMode {
    #[default]
    Teaching,
    QuizMe,
    ExplainFindings,
    ClinicalPearls,
}

impl TutorMode {
    pub const ALL: [Self; 4] = [Self::Teaching, Self::QuizMe, Self::ExplainFindings, Self::ClinicalPearls];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Teaching => "Teaching",
            Self::QuizMe => "Quiz Me",
            Self::ExplainFindings => "Explain Findings",
            Self::ClinicalPearls => "Clinical Pearls",
        }
    }

    #[must_use]
    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::Teaching => "You are a tutor. Explain the fluoroscopy and CT findings step-by-step.",
            Self::QuizMe => "You are a quiz master. Ask me questions based on this case.",
            Self::ExplainFindings => "List the key radiologic signs in CT and Fluoroscopy for this case.",
            Self::ClinicalPearls => "Give 3 clinical pearls about this diagnosis and modality use.",
        }
    }
}

// =============================================================================
// FLASHCARD
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Flashcard {
    pub question: &'static str,
    pub answer: &'static str,
}

pub const EXAMPLE_FLASHCARD: Flashcard = Flashcard {
    question: "What finding supports SMA syndrome on CT?",
    answer: "Decreased aortomesenteric angle with duodenal compression.",
};

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("API Error: {0}")]
    Llm(#[from] LlmError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSession {
    mode: TutorMode,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    #[must_use]
    pub fn new(mode: TutorMode) -> Self {
        Self { mode, messages: vec![ChatMessage::system(mode.system_prompt())] }
    }

    #[must_use]
    pub fn mode(&self) -> TutorMode {
        self.mode
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Restart the conversation under `mode`. Re-selecting the current mode keeps history.
    pub fn switch_mode(&mut self, mode: TutorMode) {
        if mode == self.mode {
            return;
        }
        *self = Self::new(mode);
    }

    /// Ask one question and return the assistant's reply.
    ///
    /// # Errors
    ///
    /// [`TutorError::EmptyQuestion`] leaves the session untouched.
    /// [`TutorError::Llm`] means the user message was recorded but no reply was.
    pub async fn ask(&mut self, completer: &dyn ChatCompleter, question: &str) -> Result<String, TutorError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(TutorError::EmptyQuestion);
        }

        self.messages.push(ChatMessage::user(question));
        let reply = completer.complete(&self.messages).await.inspect_err(|e| {
            tracing::warn!(error = %e, retryable = e.retryable(), mode = self.mode.label(), "tutor completion failed");
        })?;
        self.messages.push(ChatMessage::assistant(reply.clone()));
        Ok(reply)
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

pub type SharedSession = Arc<Mutex<ChatSession>>;

pub const DEFAULT_SESSION_IDLE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

struct SessionEntry {
    session: SharedSession,
    last_touched: Instant,
    /// Monotonic touch order; breaks ties between equal instants.
    touch: u64,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<Uuid, SessionEntry>,
    clock: u64,
}

impl RegistryInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn sweep_expired(&mut self, now: Instant, idle_ttl: Duration) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.last_touched) < idle_ttl);
        before - self.entries.len()
    }

    fn evict_least_recent(&mut self) -> Option<Uuid> {
        let oldest = self.entries.iter().min_by_key(|(_, e)| e.touch).map(|(id, _)| *id)?;
        self.entries.remove(&oldest);
        Some(oldest)
    }
}

/// Sessions by id. Idle sessions expire after `idle_ttl`; once `max_sessions`
/// is reached, creating a session evicts the least recently used one.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    idle_ttl: Duration,
    max_sessions: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_SESSION_IDLE_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `max_sessions` is raised to at least 1.
    #[must_use]
    pub fn with_limits(idle_ttl: Duration, max_sessions: usize) -> Self {
        Self { inner: Arc::new(RwLock::new(RegistryInner::default())), idle_ttl, max_sessions: max_sessions.max(1) }
    }

    /// Create a fresh session and return its id.
    pub async fn create(&self, mode: TutorMode) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(ChatSession::new(mode)));
        let now = Instant::now();

        let mut inner = self.inner.write().await;
        let expired = inner.sweep_expired(now, self.idle_ttl);
        if expired > 0 {
            tracing::debug!(expired, "idle tutor sessions expired");
        }
        while inner.entries.len() >= self.max_sessions {
            let Some(evicted) = inner.evict_least_recent() else {
                break;
            };
            tracing::debug!(id = %evicted, "tutor session evicted at capacity");
        }
        let touch = inner.tick();
        inner
            .entries
            .insert(id, SessionEntry { session: session.clone(), last_touched: now, touch });
        drop(inner);

        tracing::debug!(%id, mode = mode.label(), "tutor session created");
        (id, session)
    }

    /// Look up a live session and mark it used. Expired sessions are dropped.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        let touch = inner.tick();
        let entry = inner.entries.get_mut(&id)?;
        if now.saturating_duration_since(entry.last_touched) >= self.idle_ttl {
            inner.entries.remove(&id);
            tracing::debug!(%id, "tutor session expired");
            return None;
        }
        entry.last_touched = now;
        entry.touch = touch;
        Some(entry.session.clone())
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.inner.write().await.entries.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "tutor session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

#[cfg(test)]
#[path = "tutor_test.rs"]
mod tests;
