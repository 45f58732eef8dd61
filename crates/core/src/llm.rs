use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::{Result, TubeseekError},
    provider::{Provider, WireFormat},
    settings::RankingSettings,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anything that turns a prompt into a text reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// HTTP client for the supported chat providers.
pub struct ChatClient {
    http: reqwest::Client,
    provider: Provider,
    api_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(provider: Provider, api_key: impl Into<String>, settings: &RankingSettings) -> Result<Self> {
        let config = provider.config();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            provider,
            api_url: settings
                .api_url
                .clone()
                .unwrap_or_else(|| config.api_url.to_string()),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| config.model.to_string()),
            api_key: api_key.into(),
            max_tokens: settings.max_tokens,
        })
    }

    /// Build a client for the configured provider, reading its key from the environment.
    pub fn from_settings(settings: &RankingSettings) -> Result<Self> {
        let api_key = settings.provider.validate_api_key()?;
        Self::new(settings.provider, api_key, settings)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, prompt: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .post(&self.api_url)
            .header("Content-Type", "application/json");

        match self.provider.config().wire {
            WireFormat::AnthropicMessages => builder
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&serde_json::json!({
                    "model": self.model,
                    "max_tokens": self.max_tokens,
                    "messages": [
                        {
                            "role": "user",
                            "content": prompt,
                        },
                    ],
                })),
            WireFormat::ChatCompletions => builder
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&serde_json::json!({
                    "model": self.model,
                    "messages": [
                        {
                            "role": "user",
                            "content": prompt,
                        },
                    ],
                })),
        }
    }
}

/// Pull the reply text out of a provider response body.
pub fn extract_reply_text(wire: WireFormat, response: &Value) -> Option<&str> {
    match wire {
        WireFormat::AnthropicMessages => response["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find(|b| b["type"] == "text"))
            .and_then(|block| block["text"].as_str()),
        WireFormat::ChatCompletions => response["choices"][0]["message"]["content"].as_str(),
    }
}

#[async_trait]
impl CompletionProvider for ChatClient {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!(provider = self.name(), model = %self.model, "sending completion request");

        let response = self.request(prompt).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TubeseekError::RankingFailed {
                reason: format!("{} returned {}: {}", self.name(), status, body.trim()),
            });
        }

        let response = response.json::<Value>().await?;
        let content = extract_reply_text(self.provider.config().wire, &response).ok_or_else(|| {
            TubeseekError::RankingFailed {
                reason: format!("Invalid API response: {:?}", response),
            }
        })?;

        Ok(content.to_string())
    }
}
