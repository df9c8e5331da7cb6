//! OpenAI-compatible chat completions client.
//!
//! Sends the whole conversation to `/chat/completions` and returns the text
//! of the first choice. Tool calling and streaming are not used.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::config::LlmConfig;
use super::types::{ChatMessage, LlmError};

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client from typed config.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if reqwest cannot build a client.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one chat completion over `messages` and return the reply text.
    ///
    /// # Errors
    ///
    /// Transport failures, non-200 statuses and malformed bodies are all
    /// reported as [`LlmError`] variants.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let body = CcRequest { model: &self.model, messages };
        let text = self.send_json("/chat/completions", &body).await?;
        parse_chat_completions_response(&text)
    }

    async fn send_json(&self, path: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

// =============================================================================
// CHAT COMPLETIONS — wire types
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CcResponse {
    #[serde(default)]
    choices: Vec<CcChoice>,
}

#[derive(Deserialize)]
struct CcChoice {
    message: CcResponseMessage,
}

#[derive(Deserialize)]
struct CcResponseMessage {
    content: Option<String>,
}

fn parse_chat_completions_response(text: &str) -> Result<String, LlmError> {
    let resp: CcResponse = serde_json::from_str(text).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::ApiParse("no choices in response".into()))?;
    Ok(choice.message.content.unwrap_or_default())
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
