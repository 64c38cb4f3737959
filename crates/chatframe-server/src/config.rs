//! Server configuration

use chatframe_ai::OllamaConfig;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1)
    pub host: String,
    /// Port to listen on (default: 3000)
    pub port: u16,
    /// Inference backend configuration
    pub ollama: OllamaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let host = std::env::var("CHATFRAME_HTTP_HOST")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let port = std::env::var("CHATFRAME_HTTP_PORT")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(3000);

        Self {
            host,
            port,
            ollama: OllamaConfig::default(),
        }
    }
}
