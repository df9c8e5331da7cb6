mod cases;
mod config;
mod filter;
mod images;
mod llm;
mod routes;
mod state;
mod tutor;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::llm::ChatCompleter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return;
        }
    };

    let store = match cases::CaseStore::load(&config.cases_csv) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "case table load failed");
            return;
        }
    };
    tracing::info!(
        cases = store.len(),
        csv = %config.cases_csv.display(),
        image_dir = %config.image_dir.display(),
        "case store loaded"
    );

    // Chat is optional: the viewer still works without an API key.
    let completer: Option<Arc<dyn ChatCompleter>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured — AI tutor disabled");
            None
        }
    };

    let sessions = tutor::SessionRegistry::with_limits(config.session_idle_ttl, config.max_sessions);
    let state = state::AppState::new(store, config.image_dir.clone(), completer).with_sessions(sessions);
    let app = routes::app(state);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, port = config.port, "failed to bind");
            return;
        }
    };

    tracing::info!(port = config.port, "gi case viewer listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server failed");
    }
}
