//! Ollama client
//!
//! Thin client for a local Ollama-compatible backend: a streaming generate
//! call and a best-effort model listing. Configuration is injected so tests
//! can point it at a double.

use std::time::Duration;

use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama2";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Ollama connection configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the backend (default: http://localhost:11434)
    pub base_url: String,
    /// Model identifier passed with every generation request
    pub model: String,
    /// Deadline for connecting and receiving the start of a response
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        let base_url = std::env::var("CHATFRAME_OLLAMA_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("CHATFRAME_MODEL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Self {
            base_url,
            model,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Ollama client
pub struct OllamaClient {
    client: Client,
    config: OllamaConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaClient {
    /// Create a new client from injected configuration
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            client: build_http_client(config.timeout),
            config,
        }
    }

    /// Get the configured model identifier
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Open a streaming generation request and expose the raw byte stream.
    ///
    /// The configured deadline covers connecting and receiving the response
    /// head; a healthy stream may then run as long as it likes. There is no
    /// retry: a dead backend surfaces immediately.
    pub async fn generate_stream(
        &self,
        prompt: &str,
    ) -> Result<impl Stream<Item = reqwest::Result<bytes::Bytes>> + use<>> {
        let body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: true,
        };
        debug!(model = %self.config.model, prompt_len = prompt.len(), "opening generation stream");

        let send = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.config.timeout, send)
            .await
            .map_err(|_| AiError::Timeout(self.config.timeout.as_secs()))?
            .map_err(|e| AiError::BackendUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiError::Backend(format!(
                "generation request failed with status {}",
                response.status()
            )));
        }

        Ok(response.bytes_stream())
    }

    /// List the model identifiers the backend knows about.
    ///
    /// Best-effort passthrough: any failure (backend down, unexpected shape)
    /// degrades to an empty list rather than an error.
    pub async fn list_models(&self) -> Vec<String> {
        let request = self
            .client
            .get(format!("{}/api/tags", self.config.base_url))
            .send();

        let response = match tokio::time::timeout(self.config.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                warn!(%error, "failed to fetch models");
                return Vec::new();
            }
            Err(_) => {
                warn!("model listing timed out");
                return Vec::new();
            }
        };

        match response.json::<TagsResponse>().await {
            Ok(tags) => tags.models.into_iter().map(|m| m.name).collect(),
            Err(error) => {
                warn!(%error, "unexpected model listing shape");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> OllamaConfig {
        OllamaConfig {
            base_url,
            model: "llama2".to_string(),
            timeout: Duration::from_millis(500),
        }
    }

    #[tokio::test]
    async fn generate_stream_sends_streaming_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama2",
                "stream": true,
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{\"response\":\"ok\",\"done\":false}\n{\"done\":true}\n", "application/x-ndjson"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(test_config(server.uri()));
        let stream = client.generate_stream("user: hi").await.unwrap();
        let chunks: Vec<_> = stream.collect().await;
        let bytes: Vec<u8> = chunks
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect();
        assert!(String::from_utf8(bytes).unwrap().contains("\"done\":true"));
    }

    #[tokio::test]
    async fn generate_stream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = OllamaClient::new(test_config(server.uri()));
        match client.generate_stream("user: hi").await {
            Err(AiError::Timeout(_)) => {}
            Ok(_) => panic!("expected timeout, got Ok(stream)"),
            Err(other) => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_stream_reports_unreachable_backend() {
        let client = OllamaClient::new(test_config("http://127.0.0.1:9".to_string()));
        match client.generate_stream("user: hi").await {
            Err(AiError::BackendUnavailable(_)) | Err(AiError::Timeout(_)) => {}
            Ok(_) => panic!("expected unavailable, got Ok(stream)"),
            Err(other) => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_models_parses_tag_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [
                    {"name": "llama2", "size": 3825819519u64},
                    {"name": "mistral", "size": 4109865159u64},
                ]
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(test_config(server.uri()));
        assert_eq!(client.list_models().await, vec!["llama2", "mistral"]);
    }

    #[tokio::test]
    async fn list_models_degrades_to_empty_on_failure() {
        let client = OllamaClient::new(test_config("http://127.0.0.1:9".to_string()));
        assert!(client.list_models().await.is_empty());
    }
}
