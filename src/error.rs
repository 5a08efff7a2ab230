use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubtransError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Structural SRT violation. `line` is 1-based; 0 means the document as a whole.
    #[error("Malformed subtitle document at line {line}: {reason}")]
    MalformedDocument { line: usize, reason: String },

    #[error("Translation service error: {0}")]
    TranslationService(String),

    #[error("Translated document has {actual} blocks, source has {expected}")]
    ReassemblyMismatch { expected: usize, actual: usize },

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported target language: {0}")]
    UnsupportedLanguage(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

/// Failures raised by the delivery collaborators (cloud storage, notification webhook).
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("download failed: {0}")]
    FetchFailed(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("notification failed: {0}")]
    Notification(String),
}

impl SubtransError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            line,
            reason: reason.into(),
        }
    }

    /// True for failures that originate in the delivery stage rather than translation.
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery(_))
    }
}

pub type Result<T> = std::result::Result<T, SubtransError>;
