//! Tutor chat routes.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApiError, api_error};
use crate::llm::types::ChatMessage;
use crate::state::AppState;
use crate::tutor::{ChatSession, EXAMPLE_FLASHCARD, Flashcard, TutorError, TutorMode};

#[derive(Debug, Default, Deserialize)]
pub struct CreateSession {
    #[serde(default)]
    pub mode: TutorMode,
}

#[derive(Debug, Deserialize)]
pub struct SwitchMode {
    pub mode: TutorMode,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub mode: TutorMode,
    pub mode_label: &'static str,
    pub messages: Vec<ChatMessage>,
}

impl SessionSnapshot {
    fn of(id: Uuid, session: &ChatSession) -> Self {
        Self {
            id,
            mode: session.mode(),
            mode_label: session.mode().label(),
            messages: session.messages().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModeOption {
    pub mode: TutorMode,
    pub label: &'static str,
}

pub(crate) fn tutor_error_to_status(err: &TutorError) -> StatusCode {
    match err {
        TutorError::EmptyQuestion => StatusCode::BAD_REQUEST,
        TutorError::Llm(_) => StatusCode::BAD_GATEWAY,
    }
}

fn session_not_found(id: Uuid) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("session not found: {id}"))
}

/// `GET /api/modes` — tutor modes in display order.
pub async fn list_modes() -> Json<Vec<ModeOption>> {
    Json(TutorMode::ALL.iter().map(|&mode| ModeOption { mode, label: mode.label() }).collect())
}

/// `GET /api/flashcard` — the example flashcard.
pub async fn flashcard() -> Json<Flashcard> {
    Json(EXAMPLE_FLASHCARD)
}

/// `POST /api/sessions` — start a session seeded for the requested mode.
/// The body is optional; without one the default mode is used.
pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<CreateSession>>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let mode = body.map(|Json(b)| b.mode).unwrap_or_default();
    let (id, session) = state.sessions.create(mode).await;
    let session = session.lock().await;
    (StatusCode::CREATED, Json(SessionSnapshot::of(id, &session)))
}

/// `GET /api/sessions/:id` — current history.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state.sessions.get(id).await.ok_or_else(|| session_not_found(id))?;
    let session = session.lock().await;
    Ok(Json(SessionSnapshot::of(id, &session)))
}

/// `DELETE /api/sessions/:id` — end a session.
pub async fn delete_session(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

/// `PUT /api/sessions/:id/mode` — change mode, restarting the conversation.
pub async fn switch_mode(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SwitchMode>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state.sessions.get(id).await.ok_or_else(|| session_not_found(id))?;
    let mut session = session.lock().await;
    session.switch_mode(body.mode);
    tracing::debug!(%id, mode = body.mode.label(), "tutor mode switched");
    Ok(Json(SessionSnapshot::of(id, &session)))
}

/// `POST /api/sessions/:id/ask` — one question, one reply.
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let session = state.sessions.get(id).await.ok_or_else(|| session_not_found(id))?;
    let Some(completer) = state.completer.as_deref() else {
        return Err(api_error(StatusCode::SERVICE_UNAVAILABLE, "AI tutor is not configured"));
    };

    let mut session = session.lock().await;
    match session.ask(completer, &body.question).await {
        Ok(reply) => Ok(Json(AskResponse { reply })),
        Err(e) => Err(api_error(tutor_error_to_status(&e), e.to_string())),
    }
}

#[cfg(test)]
#[path = "tutor_test.rs"]
mod tests;
