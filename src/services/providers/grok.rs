use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::{read_success_body, ImagePayload, ProviderError, VisionProvider};
use crate::core::config::{GrokSettings, SecretString};

const PROVIDER: &str = "grok";

/// xAI Grok through its OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub(crate) struct GrokProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl GrokProvider {
    pub(crate) fn new(client: Client, settings: &GrokSettings) -> Self {
        Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }
}

#[async_trait]
impl VisionProvider for GrokProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn evaluate(&self, prompt: &str, image: &ImagePayload) -> Result<String, ProviderError> {
        let payload = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": image.to_data_url()}}
                ]
            }],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens
        });

        tracing::debug!(model = %self.model, bytes = image.len(), "Sending sketch to Grok");

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&payload)
            .send()
            .await
            .map_err(|err| ProviderError::transport(PROVIDER, err))?;

        let body = read_success_body(PROVIDER, response).await?;
        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .filter(|content| !content.trim().is_empty())
            .map(str::to_string)
            .ok_or(ProviderError::MissingText { provider: PROVIDER })
    }
}
