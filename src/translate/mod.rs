// Translation requester
//
// - Prompt: the single instruction sent with the serialized document
// - OpenAI / Ollama: completion backends behind `CompletionClient`
// - Requester: document in, raw completion out, with cancellation

pub mod ollama;
pub mod openai;
pub mod prompt;
pub mod requester;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use requester::SubtitleTranslator;

use crate::config::{Backend, TranslateConfig};
use crate::error::Result;

/// Target language plus the canonical SRT text to translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub target_language: String,
    pub document_text: String,
}

/// Completion text as returned by the service, preamble included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResponse {
    pub raw: String,
}

/// A text-generation service answering one prompt with one completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send `system` and `prompt` as a single non-streaming request.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Verify the service is reachable and the configured model exists.
    async fn check_availability(&self) -> Result<()>;

    /// Backend and model, for logs
    fn describe(&self) -> String;
}

/// Factory for completion clients
pub struct CompletionClientFactory;

impl CompletionClientFactory {
    pub fn create_client(config: &TranslateConfig) -> Result<Arc<dyn CompletionClient>> {
        match config.backend {
            Backend::OpenAi => Ok(Arc::new(openai::OpenAiClient::new(config.clone())?)),
            Backend::Ollama => Ok(Arc::new(ollama::OllamaClient::new(config.clone())?)),
        }
    }
}
