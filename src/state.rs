//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! The case store is loaded once and shared read-only. The completer is
//! optional: without an API key the viewer still works and chat answers
//! 503. Chat history lives in the session registry, never in a global.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cases::CaseStore;
use crate::llm::ChatCompleter;
use crate::tutor::SessionRegistry;

/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CaseStore>,
    pub image_dir: Arc<PathBuf>,
    pub completer: Option<Arc<dyn ChatCompleter>>,
    pub sessions: SessionRegistry,
}

impl AppState {
    #[must_use]
    pub fn new(store: CaseStore, image_dir: PathBuf, completer: Option<Arc<dyn ChatCompleter>>) -> Self {
        Self {
            store: Arc::new(store),
            image_dir: Arc::new(image_dir),
            completer,
            sessions: SessionRegistry::new(),
        }
    }

    /// Replace the session registry, e.g. to apply configured limits.
    #[must_use]
    pub fn with_sessions(mut self, sessions: SessionRegistry) -> Self {
        self.sessions = sessions;
        self
    }
}
