use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::ChatProvider;
use super::types::{ChatMessage, GenerationRequest};
use crate::core::config::Settings;
use crate::core::errors::ApiError;

/// Completion provider for any OpenAI-compatible chat endpoint.
#[derive(Clone)]
pub struct OpenAiChatProvider {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiChatProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.generator_base_url.clone(),
            settings.generator_api_key.clone(),
        )
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn chat(&self, request: &GenerationRequest, model_id: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let body = json!({
            "model": model_id,
            "messages": [ChatMessage::user(request.prompt.clone())],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::internal)?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Internal(format!(
                "completion error ({}): {}",
                model_id, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::internal)?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }
}
