//! LLM — hosted chat-completion adapter for the AI tutor.
//!
//! DESIGN
//! ======
//! The tutor needs exactly one operation: send a full message history, get
//! one reply back. `ChatCompleter` is that seam; `LlmClient` implements it
//! over an OpenAI-compatible API and tests substitute their own fakes.

pub mod config;
pub mod openai;
pub mod types;

use async_trait::async_trait;

use config::LlmConfig;
use types::{ChatMessage, LlmError};

// =============================================================================
// COMPLETION SEAM
// =============================================================================

/// Anything that can turn a conversation history into the next assistant reply.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct LlmClient {
    openai: openai::OpenAiClient,
}

impl LlmClient {
    /// Build an LLM client from environment variables (see [`LlmConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the HTTP client fails.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(&LlmConfig::from_env()?)
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self { openai: openai::OpenAiClient::new(config)? })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.openai.model()
    }
}

#[async_trait]
impl ChatCompleter for LlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.openai.chat(messages).await
    }
}
