use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::prompt::{SYSTEM_PROMPT, build_prompt};
use super::{CompletionClient, TranslationRequest, TranslationResponse};
use crate::error::{Result, SubtransError};
use crate::subtitle::SubtitleDocument;

/// Sends whole documents to a completion service, one request per call.
#[derive(Clone)]
pub struct SubtitleTranslator {
    client: Arc<dyn CompletionClient>,
}

impl SubtitleTranslator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Translate `document` into `target_language`, returning the raw completion.
    ///
    /// The document is re-serialized canonically before sending. Cancelling
    /// `cancel` aborts the in-flight request with `TranslationService`.
    pub async fn translate(
        &self,
        document: &SubtitleDocument,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<TranslationResponse> {
        let request = TranslationRequest {
            target_language: target_language.to_string(),
            document_text: document.to_srt(),
        };
        self.send(&request, cancel).await
    }

    pub async fn send(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResponse> {
        if cancel.is_cancelled() {
            return Err(SubtransError::TranslationService("translation cancelled".to_string()));
        }

        let prompt = build_prompt(request);
        info!(
            "Requesting {} translation from {} ({} chars)",
            request.target_language,
            self.client.describe(),
            request.document_text.len()
        );

        let raw = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(SubtransError::TranslationService("translation cancelled".to_string()));
            }
            result = self.client.complete(SYSTEM_PROMPT, &prompt) => result?,
        };

        debug!("Raw completion: {}", raw);

        if raw.trim().is_empty() {
            return Err(SubtransError::TranslationService("Empty translation received".to_string()));
        }

        info!("Received {} chars of translated text", raw.len());
        Ok(TranslationResponse { raw })
    }
}
