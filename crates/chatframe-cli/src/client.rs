//! HTTP client for the relay server

use std::path::Path;

use anyhow::{Context, bail};
use chatframe_ai::ChatMessage;
use serde::Deserialize;
use serde_json::json;

use crate::consumer::Exchange;

/// Client for a chatframe relay server.
#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// Prepare a new exchange for the given conversation.
    ///
    /// The exchange starts idle; call [`Exchange::send`] to open the stream.
    pub fn exchange(&self, messages: Vec<ChatMessage>, grounding: Option<String>) -> Exchange {
        let payload = json!({
            "messages": messages,
            "pdfContent": grounding,
        });
        Exchange::new(
            self.http.clone(),
            format!("{}/api/chat", self.base_url),
            payload,
        )
    }

    /// Fetch the model identifiers the relay's backend knows about.
    pub async fn models(&self) -> anyhow::Result<Vec<String>> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&json!({}))
            .send()
            .await
            .context("failed to reach relay server")?;
        let models: ModelsResponse = response
            .json()
            .await
            .context("unexpected model listing response")?;
        Ok(models.models)
    }

    /// Upload a PDF and return the text the server extracted from it.
    pub async fn upload_pdf(&self, path: &Path) -> anyhow::Result<String> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename)
            .mime_str("application/pdf")
            .context("invalid upload content type")?;
        let form = reqwest::multipart::Form::new().part("pdf", part);

        let response = self
            .http
            .post(format!("{}/api/upload-pdf", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("failed to reach relay server")?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|e| e.error)
                .unwrap_or_else(|_| status.to_string());
            bail!("upload rejected: {message}");
        }

        let upload: UploadResponse = response
            .json()
            .await
            .context("unexpected upload response")?;
        Ok(upload.content)
    }
}
