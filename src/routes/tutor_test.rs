use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use serde_json::Value;
use tower::ServiceExt;

use super::*;
use crate::cases::CaseStore;
use crate::llm::ChatCompleter;
use crate::llm::types::LlmError;
use crate::tutor::SessionRegistry;

struct Canned(&'static str);

#[async_trait]
impl ChatCompleter for Canned {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        Ok(self.0.to_string())
    }
}

struct Unauthorized;

#[async_trait]
impl ChatCompleter for Unauthorized {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        Err(LlmError::ApiResponse { status: 401, body: "invalid key".into() })
    }
}

fn state_with(completer: Option<Arc<dyn ChatCompleter>>) -> AppState {
    AppState::new(CaseStore::default(), std::env::temp_dir(), completer)
}

async fn send(state: AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = crate::routes::app(state)
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn new_session(state: &AppState, mode: &str) -> Uuid {
    let (status, body) = send(state.clone(), "POST", "/api/sessions", Some(serde_json::json!({ "mode": mode }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().parse().unwrap()
}

// =============================================================================
// helpers
// =============================================================================

#[test]
fn tutor_errors_map_to_status() {
    assert_eq!(tutor_error_to_status(&TutorError::EmptyQuestion), StatusCode::BAD_REQUEST);
    let llm = TutorError::Llm(LlmError::ApiRequest("timeout".into()));
    assert_eq!(tutor_error_to_status(&llm), StatusCode::BAD_GATEWAY);
}

// =============================================================================
// endpoints
// =============================================================================

#[tokio::test]
async fn modes_are_listed_in_order() {
    let (status, body) = send(state_with(None), "GET", "/api/modes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["mode"], "teaching");
    assert_eq!(body[1]["label"], "Quiz Me");
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn flashcard_is_served() {
    let (_, body) = send(state_with(None), "GET", "/api/flashcard", None).await;
    assert_eq!(body["question"], EXAMPLE_FLASHCARD.question);
}

#[tokio::test]
async fn create_session_seeds_system_message() {
    let state = state_with(None);
    let (status, body) = send(state, "POST", "/api/sessions", Some(serde_json::json!({ "mode": "quiz_me" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mode"], "quiz_me");
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], TutorMode::QuizMe.system_prompt());
}

#[tokio::test]
async fn create_session_without_body_defaults_to_teaching() {
    let (status, body) = send(state_with(None), "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mode"], "teaching");
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn create_session_defaults_to_teaching() {
    let (_, body) = send(state_with(None), "POST", "/api/sessions", Some(serde_json::json!({}))).await;
    assert_eq!(body["mode"], "teaching");
}

#[tokio::test]
async fn ask_appends_exchange() {
    let state = state_with(Some(Arc::new(Canned("Check the aortomesenteric angle."))));
    let id = new_session(&state, "teaching").await;

    let uri = format!("/api/sessions/{id}/ask");
    let (status, body) = send(state.clone(), "POST", &uri, Some(serde_json::json!({ "question": "SMA syndrome?" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], "Check the aortomesenteric angle.");

    let (_, snapshot) = send(state, "GET", &format!("/api/sessions/{id}"), None).await;
    let messages = snapshot["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[2]["role"], "assistant");
}

#[tokio::test]
async fn ask_failure_keeps_user_message_and_reports_api_error() {
    let state = state_with(Some(Arc::new(Unauthorized)));
    let id = new_session(&state, "teaching").await;

    let uri = format!("/api/sessions/{id}/ask");
    let (status, body) = send(state.clone(), "POST", &uri, Some(serde_json::json!({ "question": "why?" }))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().starts_with("API Error:"));

    let (_, snapshot) = send(state, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(snapshot["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn ask_empty_question_is_bad_request() {
    let state = state_with(Some(Arc::new(Canned("unused"))));
    let id = new_session(&state, "teaching").await;
    let (status, _) = send(state, "POST", &format!("/api/sessions/{id}/ask"), Some(serde_json::json!({ "question": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ask_without_completer_is_unavailable_and_leaves_history() {
    let state = state_with(None);
    let id = new_session(&state, "teaching").await;
    let (status, _) = send(state.clone(), "POST", &format!("/api/sessions/{id}/ask"), Some(serde_json::json!({ "question": "hi" }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (_, snapshot) = send(state, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(snapshot["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn switch_mode_restarts_conversation() {
    let state = state_with(Some(Arc::new(Canned("ok"))));
    let id = new_session(&state, "teaching").await;
    send(state.clone(), "POST", &format!("/api/sessions/{id}/ask"), Some(serde_json::json!({ "question": "q" }))).await;

    let (status, body) = send(
        state,
        "PUT",
        &format!("/api/sessions/{id}/mode"),
        Some(serde_json::json!({ "mode": "clinical_pearls" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode_label"], "Clinical Pearls");
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["content"], TutorMode::ClinicalPearls.system_prompt());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let state = state_with(None);
    let (status, body) = send(state, "GET", &format!("/api/sessions/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().starts_with("session not found"));
}

#[tokio::test]
async fn healthz_is_ok() {
    let (status, _) = send(state_with(None), "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_session_is_not_found() {
    let state = state_with(None);
    let id = new_session(&state, "teaching").await;
    let uri = format!("/api/sessions/{id}");

    let (status, _) = send(state.clone(), "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(state.clone(), "GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(state, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expired_session_is_not_found() {
    let state = state_with(None).with_sessions(SessionRegistry::with_limits(Duration::ZERO, 10));
    let id = new_session(&state, "teaching").await;
    let (status, _) = send(state, "GET", &format!("/api/sessions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_creates_stay_within_session_cap() {
    let state = state_with(None).with_sessions(SessionRegistry::with_limits(Duration::from_secs(3600), 5));
    for _ in 0..50 {
        send(state.clone(), "POST", "/api/sessions", None).await;
    }
    assert_eq!(state.sessions.len().await, 5);
}
