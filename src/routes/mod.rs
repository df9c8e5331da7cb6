//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! JSON endpoints for browsing and filtering cases, resolving their images,
//! and driving tutor sessions. Image files are served read-only from the
//! configured directory under `/images`.

pub mod cases;
pub mod tutor;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Path prefix under which image files are served.
pub const IMAGE_ROUTE: &str = "/images";

/// JSON error payload shared by all endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorBody { error: message.into() }))
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let images = ServeDir::new(state.image_dir.as_path());

    Router::new()
        .route("/api/tags", get(cases::list_tags))
        .route("/api/genders", get(cases::list_genders))
        .route("/api/cases", get(cases::list_cases))
        .route("/api/cases/select", get(cases::select_case))
        .route("/api/modes", get(tutor::list_modes))
        .route("/api/flashcard", get(tutor::flashcard))
        .route("/api/sessions", post(tutor::create_session))
        .route("/api/sessions/{id}", get(tutor::get_session).delete(tutor::delete_session))
        .route("/api/sessions/{id}/mode", put(tutor::switch_mode))
        .route("/api/sessions/{id}/ask", post(tutor::ask))
        .route("/healthz", get(healthz))
        .nest_service(IMAGE_ROUTE, images)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
