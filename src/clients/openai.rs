use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::clients::traits::{ProviderError, TextGenerator};
use crate::config::ProviderConfig;

/// OpenAI-compatible chat-completions client.
#[derive(Clone, Debug)]
pub struct OpenAiClient {
    endpoint: String,
    model: String,
    api_key: String,
    timeout_ms: u64,
    client: Client,
}

impl OpenAiClient {
    pub fn new(cfg: &ProviderConfig, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }

        // Ensure endpoint has the correct path if not provided
        let endpoint = if cfg.base_url.ends_with("/chat/completions") {
            cfg.base_url.clone()
        } else {
            format!("{}/chat/completions", cfg.base_url.trim_end_matches('/'))
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| ProviderError::Http(format!("build http client: {}", e)))?;

        Ok(Self {
            endpoint,
            model: cfg.model.clone(),
            api_key,
            timeout_ms: cfg.timeout_ms,
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "max_tokens": max_output_tokens,
            "temperature": temperature
        });

        tracing::debug!(
            "chat completion request: model={}, max_tokens={}, prompt_chars={}",
            self.model,
            max_output_tokens,
            prompt.chars().count()
        );

        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| match ProviderError::from(e) {
                ProviderError::Timeout { .. } => ProviderError::Timeout {
                    timeout_ms: self.timeout_ms,
                },
                other => other,
            })?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status, body });
        }

        let response_json: Value = res.json().await?;
        extract_content(&response_json)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response body.
pub fn extract_content(response: &Value) -> Result<String, ProviderError> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ProviderError::EmptyResponse)
}
