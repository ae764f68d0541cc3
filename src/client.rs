//! Client for the prediction endpoint.
//!
//! Mirrors how the web backend calls the service: one multipart upload,
//! a fixed timeout, no retries.

use crate::constants::IMAGE_FIELD;
use crate::error::{Error, Result};
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Raw status and body returned by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictOutcome {
    /// HTTP status code.
    pub status: u16,
    /// Response body text.
    pub body: String,
}

impl PredictOutcome {
    /// Whether the service answered with a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Upload an image file to `url` and return the service's answer.
///
/// Transport failures and timeouts become [`Error::UpstreamUnreachable`];
/// any HTTP answer, including errors, is returned as an outcome.
pub async fn predict_file(url: &str, image: &Path, timeout: Duration) -> Result<PredictOutcome> {
    if !image.exists() {
        return Err(Error::ImageFileNotFound {
            path: image.to_path_buf(),
        });
    }

    let bytes = tokio::fs::read(image).await?;
    let file_name = image
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());

    predict_bytes(url, bytes, file_name, timeout).await
}

/// Upload in-memory image bytes to `url`.
pub async fn predict_bytes(
    url: &str,
    bytes: Vec<u8>,
    file_name: String,
    timeout: Duration,
) -> Result<PredictOutcome> {
    let mime = mime_for(&file_name);
    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(mime)
        .map_err(|e| Error::Internal {
            message: format!("invalid content type '{mime}': {e}"),
        })?;
    let form = Form::new().part(IMAGE_FIELD, part);

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Internal {
            message: format!("failed to build HTTP client: {e}"),
        })?;

    debug!("POST {url} (timeout {}s)", timeout.as_secs());

    let response = client
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| Error::UpstreamUnreachable {
            url: url.to_string(),
            source: e,
        })?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| Error::UpstreamUnreachable {
            url: url.to_string(),
            source: e,
        })?;

    Ok(PredictOutcome { status, body })
}

fn mime_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "image/jpeg",
    }
}
