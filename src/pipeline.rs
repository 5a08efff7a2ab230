use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::TranslateConfig;
use crate::delivery::{Delivery, NotificationReceipt, Notifier};
use crate::error::{Result, SubtransError};
use crate::languages;
use crate::reassemble::{Diagnostic, Reassembler, Reassembly};
use crate::subtitle::{SubtitleDocument, parse, parse_bytes};
use crate::translate::{CompletionClient, CompletionClientFactory, SubtitleTranslator};

const SECONDS_PER_CHAR: f64 = 0.013;

/// Rough wall-clock estimate for translating `chars` characters.
pub fn estimate_duration(chars: usize) -> Duration {
    Duration::from_secs_f64(chars as f64 * SECONDS_PER_CHAR)
}

/// `{language}_{stem}.srt`, the name used for locally translated files.
pub fn output_file_name(input: &Path, language: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subtitles".to_string());
    format!("{}_{}.srt", languages::file_label(language), stem)
}

/// `translated_{language}.srt`, the name used for webhook-triggered uploads.
pub fn webhook_output_name(language: &str) -> String {
    format!("translated_{}.srt", languages::file_label(language))
}

/// A translated file written to disk.
#[derive(Debug, Clone)]
pub struct TranslatedFile {
    pub path: PathBuf,
    pub language: String,
    pub blocks: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// A translated file accepted by the delivery webhook.
#[derive(Debug, Clone)]
pub struct DeliveredFile {
    pub file: TranslatedFile,
    pub receipt: NotificationReceipt,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub translated: Vec<TranslatedFile>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Reader -> Requester -> Reassembler.
///
/// Holds no mutable state; one instance can serve concurrent invocations.
pub struct Pipeline {
    config: TranslateConfig,
    translator: SubtitleTranslator,
    reassembler: Reassembler,
}

impl Pipeline {
    pub fn new(config: TranslateConfig) -> Result<Self> {
        let client = CompletionClientFactory::create_client(&config)?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: TranslateConfig, client: Arc<dyn CompletionClient>) -> Self {
        let reassembler = Reassembler::new(config.preamble, config.strict_block_count);
        Self {
            config,
            translator: SubtitleTranslator::new(client),
            reassembler,
        }
    }

    pub fn resolve_language(&self, input: &str) -> Result<String> {
        languages::resolve(input, self.config.allow_custom_language)
    }

    /// Translate a parsed document.
    ///
    /// With `chunk_size > 0` the document is sent in windows of that many
    /// blocks, one request each, and the reassembled windows are joined.
    pub async fn translate_document(
        &self,
        document: &SubtitleDocument,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<Reassembly> {
        let language = self.resolve_language(target_language)?;
        let windows = document.windows(self.config.chunk_size);
        let total = windows.len();

        let mut parts = Vec::with_capacity(total);
        let mut diagnostics = Vec::new();

        for (idx, window) in windows.iter().enumerate() {
            if total > 1 {
                info!("Translating window {}/{} ({} blocks)", idx + 1, total, window.len());
            }
            let response = self.translator.translate(window, &language, cancel).await?;
            let reassembly = self.reassembler.reassemble_against(&response.raw, window)?;
            parts.push(reassembly.document);
            diagnostics.extend(reassembly.diagnostics);
        }

        let document = if parts.len() == 1 {
            parts.remove(0)
        } else {
            SubtitleDocument::concat(parts)?
        };

        info!(
            "Translated {} blocks into {} ({} diagnostics)",
            document.len(),
            language,
            diagnostics.len()
        );

        Ok(Reassembly { document, diagnostics })
    }

    pub async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<Reassembly> {
        let document = parse(text)?;
        info!(
            "Estimated time for translation: {:.2} seconds",
            estimate_duration(text.chars().count()).as_secs_f64()
        );
        self.translate_document(&document, target_language, cancel).await
    }

    pub async fn translate_bytes(
        &self,
        bytes: &[u8],
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<Reassembly> {
        let document = parse_bytes(bytes)?;
        self.translate_document(&document, target_language, cancel).await
    }

    /// Translate `input` and write `{language}_{stem}.srt` next to it or into `output_dir`.
    pub async fn translate_file(
        &self,
        input: &Path,
        output_dir: Option<&Path>,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<TranslatedFile> {
        info!("Translating subtitle file: {}", input.display());

        if !input.exists() {
            return Err(SubtransError::FileNotFound(input.display().to_string()));
        }

        let language = self.resolve_language(target_language)?;
        let output_dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input
                .parent()
                .ok_or_else(|| {
                    SubtransError::Config("Cannot determine output directory".to_string())
                })?
                .to_path_buf(),
        };
        fs::create_dir_all(&output_dir).await?;

        let text = fs::read_to_string(input).await?;
        let reassembly = self.translate_text(&text, &language, cancel).await?;

        let path = output_dir.join(output_file_name(input, &language));
        fs::write(&path, reassembly.document.to_srt()).await?;
        info!("Wrote translated subtitles: {}", path.display());

        Ok(TranslatedFile {
            path,
            language,
            blocks: reassembly.document.len(),
            diagnostics: reassembly.diagnostics,
        })
    }

    /// Translate `input` next to itself and post the result to `notifier` for `recipient`.
    ///
    /// A reply without a download link still counts as delivered.
    pub async fn deliver_file(
        &self,
        notifier: &dyn Notifier,
        input: &Path,
        target_language: &str,
        recipient: &str,
        cancel: &CancellationToken,
    ) -> Result<DeliveredFile> {
        let file = self.translate_file(input, None, target_language, cancel).await?;

        let bytes = fs::read(&file.path).await?;
        let file_name = file
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| output_file_name(input, &file.language));

        info!("Delivering {} to {}", file_name, recipient);
        let receipt = notifier
            .notify(Delivery {
                file_name,
                bytes,
                target_language: file.language.clone(),
                recipient: recipient.to_string(),
            })
            .await?;

        Ok(DeliveredFile { file, receipt })
    }

    /// Translate every `.srt` file under `input_dir`; failures are collected, not fatal.
    pub async fn translate_directory(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchSummary> {
        info!("Processing directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(SubtransError::Config("Input path is not a directory".to_string()));
        }

        let mut srt_files = Vec::new();
        for entry in WalkDir::new(input_dir).into_iter().filter_map(|e| e.ok()) {
            let is_srt = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"));
            if entry.file_type().is_file() && is_srt {
                srt_files.push(entry.path().to_path_buf());
            }
        }
        srt_files.sort();

        info!("Found {} subtitle files to translate", srt_files.len());

        let mut summary = BatchSummary::default();
        for path in srt_files {
            if cancel.is_cancelled() {
                warn!("Batch cancelled before {}", path.display());
                break;
            }
            match self.translate_file(&path, output_dir, target_language, cancel).await {
                Ok(file) => {
                    info!("Successfully translated: {}", path.display());
                    summary.translated.push(file);
                }
                Err(e) => {
                    warn!("Failed to translate {}: {}", path.display(), e);
                    summary.failed.push((path, e.to_string()));
                }
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreambleStrategy;
    use crate::delivery::MockNotifier;
    use crate::error::DeliveryError;
    use crate::translate::MockCompletionClient;
    use chrono::Utc;

    const SOURCE: &str = "1\n00:00:01,000 --> 00:00:03,000\nHello, how are you?\n\n\
                          2\n00:00:04,000 --> 00:00:06,000\nI'm doing great, thank you.\n";

    const FRENCH: &str = "Voici la traduction :\n\n\
                          1\n00:00:01,000 --> 00:00:03,000\nBonjour, comment allez-vous ?\n\n\
                          2\n00:00:04,000 --> 00:00:06,000\nJe vais très bien, merci.\n";

    fn mock_returning(responses: Vec<&'static str>) -> MockCompletionClient {
        let mut client = MockCompletionClient::new();
        client.expect_describe().return_const("mock".to_string());
        let mut queue = responses.into_iter();
        client
            .expect_complete()
            .returning(move |_, _| Ok(queue.next().unwrap_or_default().to_string()));
        client
    }

    fn pipeline(config: TranslateConfig, client: MockCompletionClient) -> Pipeline {
        Pipeline::with_client(config, Arc::new(client))
    }

    #[tokio::test]
    async fn test_end_to_end_french() {
        let pipeline = pipeline(TranslateConfig::default(), mock_returning(vec![FRENCH]));
        let source = parse(SOURCE).unwrap();

        let reassembly = pipeline
            .translate_text(SOURCE, "French", &CancellationToken::new())
            .await
            .unwrap();

        assert!(reassembly.diagnostics.is_empty());
        assert_eq!(reassembly.document.len(), 2);
        for (translated, original) in reassembly.document.blocks().iter().zip(source.blocks()) {
            assert_eq!(translated.index(), original.index());
            assert_eq!(translated.start(), original.start());
            assert_eq!(translated.end(), original.end());
            assert!(!translated.text().trim().is_empty());
            assert_ne!(translated.text(), original.text());
        }
    }

    #[tokio::test]
    async fn test_mismatch_keeps_output_usable() {
        let three = format!("{}\n3\n00:00:07,000 --> 00:00:08,000\nBye.\n", SOURCE);
        let translated = "1\n00:00:01,000 --> 00:00:03,000\nBonjour\n\n\
                          2\n00:00:04,000 --> 00:00:06,000\nMerci\n";
        let pipeline = pipeline(TranslateConfig::default(), mock_returning(vec![translated]));

        let reassembly = pipeline
            .translate_text(&three, "fr", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(reassembly.document.len(), 2);
        assert!(reassembly.has_mismatch());
    }

    /// Replies to each window based on the document section of the prompt only.
    fn windowed_client(calls: usize) -> MockCompletionClient {
        let mut client = MockCompletionClient::new();
        client.expect_describe().return_const("mock".to_string());
        client
            .expect_complete()
            .times(calls)
            .returning(|_, prompt| {
                let input = prompt.rsplit("Input:\n").next().unwrap_or_default();
                let text = if input.starts_with("1\n") {
                    "1\n00:00:01,000 --> 00:00:03,000\nBonjour\n"
                } else {
                    "Voici :\n2\n00:00:04,000 --> 00:00:06,000\nMerci\n"
                };
                Ok(text.to_string())
            });
        client
    }

    #[tokio::test]
    async fn test_chunked_translation_issues_one_call_per_window() {
        let config = TranslateConfig {
            chunk_size: 1,
            ..TranslateConfig::default()
        };
        let reassembly = pipeline(config, windowed_client(2))
            .translate_text(SOURCE, "French", &CancellationToken::new())
            .await
            .unwrap();

        assert!(reassembly.diagnostics.is_empty());
        assert_eq!(
            reassembly.document.to_srt(),
            "1\n00:00:01,000 --> 00:00:03,000\nBonjour\n\n2\n00:00:04,000 --> 00:00:06,000\nMerci\n"
        );
    }

    #[tokio::test]
    async fn test_chunked_translation_with_legacy_preamble() {
        let config = TranslateConfig {
            chunk_size: 1,
            preamble: PreambleStrategy::FirstOne,
            ..TranslateConfig::default()
        };
        let reassembly = pipeline(config, windowed_client(2))
            .translate_text(SOURCE, "French", &CancellationToken::new())
            .await
            .unwrap();

        assert!(reassembly.diagnostics.is_empty());
        assert_eq!(reassembly.document.len(), 2);
        let second = &reassembly.document.blocks()[1];
        assert_eq!(second.index(), 2);
        assert_eq!(second.text(), "Merci");
    }

    #[tokio::test]
    async fn test_unsupported_language_fails_before_request() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().never();

        let result = pipeline(TranslateConfig::default(), client)
            .translate_text(SOURCE, "Elvish", &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(SubtransError::UnsupportedLanguage(_))));
    }

    #[tokio::test]
    async fn test_malformed_source_fails_before_request() {
        let mut client = MockCompletionClient::new();
        client.expect_complete().never();

        let result = pipeline(TranslateConfig::default(), client)
            .translate_text("not subtitles", "French", &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(SubtransError::MalformedDocument { .. })));
    }

    #[tokio::test]
    async fn test_refusal_surfaces_as_malformed() {
        let pipeline = pipeline(
            TranslateConfig::default(),
            mock_returning(vec!["I cannot help with that."]),
        );
        let result = pipeline
            .translate_text(SOURCE, "French", &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(SubtransError::MalformedDocument { .. })));
    }

    #[tokio::test]
    async fn test_translate_file_writes_language_prefixed_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("episode01.srt");
        std::fs::write(&input, SOURCE).unwrap();

        let pipeline = pipeline(TranslateConfig::default(), mock_returning(vec![FRENCH]));
        let file = pipeline
            .translate_file(&input, None, "French", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(file.path, dir.path().join("French_episode01.srt"));
        let written = std::fs::read_to_string(&file.path).unwrap();
        assert!(written.starts_with("1\n00:00:01,000 --> 00:00:03,000\nBonjour"));
    }

    fn receipt(link: Option<&str>) -> NotificationReceipt {
        NotificationReceipt {
            link: link.map(str::to_string),
            delivered_at: Utc::now(),
        }
    }

    fn episode(dir: &Path) -> PathBuf {
        let input = dir.join("episode01.srt");
        std::fs::write(&input, SOURCE).unwrap();
        input
    }

    #[tokio::test]
    async fn test_deliver_file_returns_link() {
        let dir = tempfile::tempdir().unwrap();
        let input = episode(dir.path());

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|delivery| {
                delivery.file_name == "French_episode01.srt"
                    && delivery.target_language == "French"
                    && delivery.recipient == "editor@example.com"
                    && String::from_utf8_lossy(&delivery.bytes).contains("Bonjour")
            })
            .times(1)
            .returning(|_| Ok(receipt(Some("https://drive.google.com/file/d/xyz"))));

        let pipeline = pipeline(TranslateConfig::default(), mock_returning(vec![FRENCH]));
        let delivered = pipeline
            .deliver_file(&notifier, &input, "fr", "editor@example.com", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(delivered.file.path, dir.path().join("French_episode01.srt"));
        assert_eq!(
            delivered.receipt.link.as_deref(),
            Some("https://drive.google.com/file/d/xyz")
        );
    }

    #[tokio::test]
    async fn test_deliver_file_without_link_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let input = episode(dir.path());

        let mut notifier = MockNotifier::new();
        notifier.expect_notify().times(1).returning(|_| Ok(receipt(None)));

        let pipeline = pipeline(TranslateConfig::default(), mock_returning(vec![FRENCH]));
        let cancel = CancellationToken::new();
        let delivered = pipeline
            .deliver_file(&notifier, &input, "French", "editor@example.com", &cancel)
            .await
            .unwrap();

        assert!(delivered.receipt.link.is_none());
        assert_eq!(delivered.file.blocks, 2);
    }

    #[tokio::test]
    async fn test_deliver_file_surfaces_notifier_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = episode(dir.path());

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .times(1)
            .returning(|_| Err(DeliveryError::Notification("HTTP 500".to_string()).into()));

        let pipeline = pipeline(TranslateConfig::default(), mock_returning(vec![FRENCH]));
        let cancel = CancellationToken::new();
        let err = pipeline
            .deliver_file(&notifier, &input, "French", "editor@example.com", &cancel)
            .await
            .unwrap_err();

        assert!(err.is_delivery());
        assert!(dir.path().join("French_episode01.srt").exists());
    }

    #[tokio::test]
    async fn test_translate_directory_collects_failures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.srt"), SOURCE).unwrap();
        std::fs::write(dir.path().join("b.srt"), "garbage").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let out = dir.path().join("out");

        let pipeline = pipeline(TranslateConfig::default(), mock_returning(vec![FRENCH]));
        let summary = pipeline
            .translate_directory(dir.path(), Some(&out), "French", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary.translated.len(), 1);
        assert_eq!(summary.failed.len(), 1);
        assert!(out.join("French_a.srt").exists());
    }

    #[test]
    fn test_new_builds_configured_backend() {
        let config = TranslateConfig {
            backend: crate::config::Backend::Ollama,
            endpoint: "http://localhost:11434".to_string(),
            ..TranslateConfig::default()
        };
        let pipeline = Pipeline::new(config).unwrap();
        assert_eq!(pipeline.resolve_language("fr").unwrap(), "French");
    }

    #[test]
    fn test_output_names_and_estimate() {
        assert_eq!(
            output_file_name(Path::new("/tmp/show.srt"), "Spanish (Spain)"),
            "Spanish_Spain_show.srt"
        );
        assert_eq!(webhook_output_name("German"), "translated_German.srt");
        assert!((estimate_duration(1000).as_secs_f64() - 13.0).abs() < 1e-6);
    }
}
