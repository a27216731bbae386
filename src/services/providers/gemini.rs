use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{read_success_body, ImagePayload, ProviderError, VisionProvider};
use crate::core::config::{GeminiSettings, SecretString};

const PROVIDER: &str = "gemini";

/// Google Gemini `generateContent` with the image sent as `inline_data`.
#[derive(Debug, Clone)]
pub(crate) struct GeminiProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub(crate) fn new(client: Client, settings: &GeminiSettings) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl VisionProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn evaluate(&self, prompt: &str, image: &ImagePayload) -> Result<String, ProviderError> {
        let payload = json!({
            "contents": [{
                "parts": [
                    {"text": prompt},
                    {"inline_data": {"mime_type": image.mime_type(), "data": image.to_base64()}}
                ]
            }]
        });

        tracing::debug!(model = %self.model, bytes = image.len(), "Sending sketch to Gemini");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.expose())])
            .json(&payload)
            .send()
            .await
            .map_err(|err| ProviderError::transport(PROVIDER, err))?;

        let body = read_success_body(PROVIDER, response).await?;
        candidate_text(&body).ok_or(ProviderError::MissingText { provider: PROVIDER })
    }
}

/// Joins the text parts of the first candidate.
fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")
        .and_then(|candidates| candidates.get(0))
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)?;

    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}
