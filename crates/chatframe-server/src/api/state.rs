use std::sync::Arc;

use chatframe_ai::OllamaClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ollama: Arc<OllamaClient>,
}
