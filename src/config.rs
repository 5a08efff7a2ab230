use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, SubtransError};

fn default_timeout_secs() -> u64 {
    300
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_access_token_env() -> String {
    "GOOGLE_DRIVE_ACCESS_TOKEN".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Completion backend
    pub backend: Backend,
    /// Base URL of the completion service
    pub endpoint: String,
    /// Model used for translation
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// API key; when absent the variable named by `api_key_env` is read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_key_env: String,
    /// Request timeout applied to the HTTP client
    pub timeout_secs: u64,
    /// Blocks per completion request; 0 sends the whole document at once
    pub chunk_size: usize,
    /// How leading commentary is removed from the completion
    pub preamble: PreambleStrategy,
    /// Treat a block-count mismatch as an error instead of a diagnostic
    pub strict_block_count: bool,
    /// Accept target languages outside the supported list
    pub allow_custom_language: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// OpenAI-compatible chat completions API
    OpenAi,
    /// Local Ollama server
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreambleStrategy {
    /// Start at the first line that is an index followed by a timing line
    #[default]
    Structural,
    /// Start at the first '1' character anywhere in the response
    FirstOne,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Automation endpoint receiving translated files and the recipient address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    /// Drive metadata/download API base
    pub api_base: String,
    /// Drive upload API base
    pub upload_base: String,
    /// OAuth access token; when absent the variable named by `access_token_env` is read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    pub access_token_env: String,
    /// Folder receiving translated uploads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Webhook listener bind address
    pub bind_address: String,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            backend: Backend::OpenAi,
            endpoint: "https://api.openai.com".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
            chunk_size: 0,
            preamble: PreambleStrategy::Structural,
            strict_block_count: false,
            allow_custom_language: false,
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
            access_token: None,
            access_token_env: default_access_token_env(),
            folder_id: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
        }
    }
}

impl TranslateConfig {
    /// API key from the config file, falling back to the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl DriveConfig {
    pub fn resolve_access_token(&self) -> Result<String> {
        self.access_token
            .clone()
            .or_else(|| std::env::var(&self.access_token_env).ok())
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                SubtransError::Config(format!(
                    "No Drive access token configured; set drive.access_token or {}",
                    self.access_token_env
                ))
            })
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubtransError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubtransError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubtransError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubtransError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
