//! Chatframe AI - streaming core for the chat relay
//!
//! This crate provides:
//! - Conversation types shared by the relay server and the terminal client
//! - Prompt rendering for the generation backend
//! - An Ollama client (streaming generation + model listing)
//! - The chunk reframer: newline-delimited JSON in, SSE frames out
//! - `LineBuffer`, the line-assembly discipline both ends of the wire share

pub mod chat;
pub mod error;
mod http_client;
pub mod line_buffer;
pub mod ollama;
pub mod prompt;
pub mod reframe;

// Re-export commonly used types
pub use chat::{ChatMessage, Role};
pub use error::{AiError, Result};
pub use line_buffer::LineBuffer;
pub use ollama::{OllamaClient, OllamaConfig};
pub use prompt::render_prompt;
pub use reframe::{DONE_SENTINEL, RelayFrame, TokenEvent, reframe};
