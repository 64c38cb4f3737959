//! Chat relay endpoint
//!
//! `POST /api/chat` carries two request shapes, matching the widget: a body
//! with `messages` opens a streaming exchange, a body without one asks for
//! the backend's model listing.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chatframe_ai::{ChatMessage, reframe, render_prompt};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use tracing::{error, info};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub pdf_content: Option<String>,
}

pub async fn chat(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    if body.get("messages").is_none() {
        let models = state.ollama.list_models().await;
        return Json(json!({ "models": models })).into_response();
    }

    let request: ChatRequest = match serde_json::from_value(body) {
        Ok(request) => request,
        Err(error) => {
            return ApiError::bad_request(format!("Invalid messages format: {error}"))
                .into_response();
        }
    };

    info!(
        turns = request.messages.len(),
        grounded = request.pdf_content.is_some(),
        "opening exchange"
    );

    let prompt = render_prompt(&request.messages, request.pdf_content.as_deref());
    let upstream = match state.ollama.generate_stream(&prompt).await {
        Ok(upstream) => upstream,
        Err(err) => {
            error!(error = %err, "failed to reach inference backend");
            return ApiError::internal("Failed to generate response from backend").into_response();
        }
    };

    // Frames are pulled through one at a time: a slow reader stalls the
    // backend read instead of growing a buffer here. The terminal sentinel
    // frame, when the backend completes, is the last write before close.
    let frames = reframe(upstream).map(|frame| Ok::<_, Infallible>(frame.to_sse()));

    let headers = [
        (header::CONTENT_TYPE, "text/event-stream"),
        (header::CACHE_CONTROL, "no-cache"),
        (header::CONNECTION, "keep-alive"),
    ];
    (headers, Body::from_stream(frames)).into_response()
}
