//! Chatframe relay server
//!
//! Accepts the chat widget's conversation, opens a streaming generation
//! request against a local Ollama-compatible backend, and re-frames the
//! backend's NDJSON token stream as SSE. Also handles PDF uploads whose
//! extracted text grounds later exchanges.

pub mod api;
pub mod config;

use std::sync::Arc;

use axum::{
    Json, Router,
    http::{Method, header},
    routing::{get, post},
};
use chatframe_ai::{OllamaClient, OllamaConfig};
use tower_http::cors::CorsLayer;

use api::AppState;

/// Build the full application router.
pub fn build_router(ollama: OllamaConfig) -> Router {
    let state = AppState {
        ollama: Arc::new(OllamaClient::new(ollama)),
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(api::chat::chat))
        .route("/api/upload-pdf", post(api::upload::upload_pdf))
        .layer(cors)
        .with_state(state)
}

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "chatframe is working!".to_string(),
    })
}
