// Delivery collaborators
//
// - Drive: fetch source files and upload translations to cloud storage
// - Webhook: notify the automation endpoint that a translation is ready

pub mod drive;
pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use drive::DriveStore;
pub use webhook::WebhookNotifier;

use crate::error::Result;

/// A file stored in the cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub id: String,
    pub link: Option<String>,
}

/// Cloud storage holding source subtitles and receiving translations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Raw bytes of the file with the given opaque identifier.
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>>;

    /// Store `bytes` under `file_name` in the destination folder.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<StoredFile>;
}

/// A translated file addressed to a recipient.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub target_language: String,
    pub recipient: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationReceipt {
    /// Retrievable link returned by the endpoint, if any
    pub link: Option<String>,
    pub delivered_at: DateTime<Utc>,
}

/// Outbound delivery notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, delivery: Delivery) -> Result<NotificationReceipt>;
}
