mod gemini;
mod grok;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use thiserror::Error;

use crate::core::config::{ProviderKind, Settings};

pub(crate) use gemini::GeminiProvider;
pub(crate) use grok::GrokProvider;

/// Longest provider error body kept for logs.
pub(crate) const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub(crate) enum ProviderError {
    #[error("{provider} returned status {status}: {body}")]
    Status { provider: &'static str, status: u16, body: String },
    #[error("{provider} request failed: {message}")]
    Transport { provider: &'static str, message: String },
    #[error("{provider} returned a non-JSON envelope: {body}")]
    InvalidEnvelope { provider: &'static str, body: String },
    #[error("{provider} response did not contain any text")]
    MissingText { provider: &'static str },
}

impl ProviderError {
    pub(crate) fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn transport(provider: &'static str, err: reqwest::Error) -> Self {
        let err = err.without_url();
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            truncate_body(&err.to_string(), ERROR_BODY_LIMIT)
        };
        ProviderError::Transport { provider, message }
    }
}

/// Image bytes plus the MIME type inferred from the upload's extension.
#[derive(Debug, Clone)]
pub(crate) struct ImagePayload {
    bytes: Vec<u8>,
    mime_type: &'static str,
}

impl ImagePayload {
    pub(crate) fn new(bytes: Vec<u8>, extension: &str) -> Self {
        Self { bytes, mime_type: mime_for_extension(extension) }
    }

    pub(crate) fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub(crate) fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// A multimodal model that reads a sketch and answers with grading text.
#[async_trait]
pub(crate) trait VisionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn evaluate(&self, prompt: &str, image: &ImagePayload) -> Result<String, ProviderError>;
}

pub(crate) fn from_settings(settings: &Settings) -> Result<Arc<dyn VisionProvider>> {
    let ai = settings.ai();
    let client = Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(ai.request_timeout_seconds))
        .build()
        .context("Failed to build AI provider HTTP client")?;

    let provider: Arc<dyn VisionProvider> = match ai.provider {
        ProviderKind::Gemini => Arc::new(GeminiProvider::new(client, &ai.gemini)),
        ProviderKind::Grok => Arc::new(GrokProvider::new(client, &ai.grok)),
    };

    tracing::info!(
        provider = ai.provider.as_str(),
        timeout_seconds = ai.request_timeout_seconds,
        "AI provider configured"
    );
    Ok(provider)
}

pub(crate) fn mime_for_extension(extension: &str) -> &'static str {
    match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

pub(crate) fn truncate_body(body: &str, limit: usize) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Reads the body and turns a non-2xx status into [`ProviderError::Status`].
async fn read_success_body(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<serde_json::Value, ProviderError> {
    let status = response.status();
    let raw = response.text().await.map_err(|err| ProviderError::transport(provider, err))?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status: status.as_u16(),
            body: truncate_body(&raw, ERROR_BODY_LIMIT),
        });
    }

    serde_json::from_str(&raw).map_err(|_| ProviderError::InvalidEnvelope {
        provider,
        body: truncate_body(&raw, ERROR_BODY_LIMIT),
    })
}
