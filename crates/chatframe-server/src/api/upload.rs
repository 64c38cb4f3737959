//! PDF upload endpoint
//!
//! Takes a multipart form with a single `pdf` file field, spools it to a
//! temporary file, extracts the text, and returns it for the caller to hold
//! as grounding for later exchanges. The temporary file is removed on every
//! path, success or failure.

use std::io::Write;

use axum::{Json, extract::Multipart};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::ApiError;

const PDF_CONTENT_TYPE: &str = "application/pdf";

pub async fn upload_pdf(mut multipart: Multipart) -> Result<Json<Value>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to process file upload: {e}")))?
    {
        if field.name() != Some("pdf") {
            continue;
        }

        if field.content_type() != Some(PDF_CONTENT_TYPE) {
            return Err(ApiError::bad_request("Uploaded file is not a PDF"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read uploaded file: {e}")))?;

        // Spool through a temp file; it is unlinked when `spool` drops, so
        // extraction failures cannot leave it behind.
        let mut spool = tempfile::NamedTempFile::new()
            .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;
        spool
            .write_all(&data)
            .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;
        debug!(path = %spool.path().display(), bytes = data.len(), "spooled upload");

        let buffer = std::fs::read(spool.path())
            .map_err(|e| ApiError::internal(format!("Failed to read upload: {e}")))?;
        let content = pdf_extract::extract_text_from_mem(&buffer)
            .map_err(|e| ApiError::internal(format!("Failed to process PDF: {e}")))?;

        info!(chars = content.len(), "extracted PDF text");
        return Ok(Json(json!({ "content": content })));
    }

    Err(ApiError::bad_request("No PDF file uploaded"))
}
