use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::CompletionClient;
use crate::config::TranslateConfig;
use crate::error::{Result, SubtransError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

/// OpenAI-compatible chat completions client
pub struct OpenAiClient {
    client: Client,
    config: TranslateConfig,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            SubtransError::Config(format!(
                "No API key configured; set translate.api_key or {}",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config, api_key })
    }

    fn build_request(&self, system: &str, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.config.temperature,
        }
    }
}

/// Pull the first choice's content out of a chat response.
pub fn extract_completion(response: ChatResponse) -> Result<String> {
    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| {
            SubtransError::TranslationService("Response contained no choices".to_string())
        })?;

    if content.trim().is_empty() {
        return Err(SubtransError::TranslationService("Empty translation received".to_string()));
    }
    Ok(content)
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.config.endpoint.trim_end_matches('/'));
        debug!("Sending translation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(system, prompt))
            .send()
            .await
            .map_err(|e| SubtransError::TranslationService(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubtransError::TranslationService(format!(
                "Completion API error {}: {}",
                status, error_text
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| {
                SubtransError::TranslationService(format!("Failed to parse response: {}", e))
            })?;

        extract_completion(chat)
    }

    async fn check_availability(&self) -> Result<()> {
        let url = format!(
            "{}/v1/models/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| {
                SubtransError::TranslationService(format!(
                    "Failed to reach completion API: {}",
                    e
                ))
            })?;

        if response.status().is_success() {
            info!("Model '{}' is available", self.config.model);
            Ok(())
        } else {
            Err(SubtransError::TranslationService(format!(
                "Model '{}' is not available: HTTP {}",
                self.config.model,
                response.status()
            )))
        }
    }

    fn describe(&self) -> String {
        format!("openai:{}", self.config.model)
    }
}
