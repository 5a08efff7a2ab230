use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{FileStore, StoredFile};
use crate::config::DriveConfig;
use crate::error::{DeliveryError, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

/// Google Drive v3 REST store authenticated with a bearer access token
pub struct DriveStore {
    client: Client,
    config: DriveConfig,
    access_token: String,
}

impl DriveStore {
    pub fn new(config: DriveConfig) -> Result<Self> {
        let access_token = config.resolve_access_token()?;
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;

        Ok(Self {
            client,
            config,
            access_token,
        })
    }

    fn metadata(&self, file_name: &str) -> serde_json::Value {
        match &self.config.folder_id {
            Some(folder) => json!({ "name": file_name, "parents": [folder] }),
            None => json!({ "name": file_name }),
        }
    }
}

/// Build a `multipart/related` body: JSON metadata part then the file content.
fn related_body(boundary: &str, metadata: &serde_json::Value, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 256);
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n--{b}\r\nContent-Type: text/plain\r\n\r\n",
            b = boundary,
            meta = metadata
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[async_trait]
impl FileStore for DriveStore {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/files/{}", self.config.api_base.trim_end_matches('/'), file_id);
        debug!("Downloading Drive file: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("alt", "media")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| DeliveryError::FetchFailed(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| DeliveryError::FetchFailed(e.to_string()))?;
                info!("Downloaded {} bytes from Drive file {}", bytes.len(), file_id);
                Ok(bytes.to_vec())
            }
            StatusCode::NOT_FOUND => Err(DeliveryError::NotFound(file_id.to_string()).into()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(DeliveryError::PermissionDenied(file_id.to_string()).into())
            }
            status => {
                Err(DeliveryError::FetchFailed(format!("HTTP {} for {}", status, file_id)).into())
            }
        }
    }

    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<StoredFile> {
        let url = format!("{}/files", self.config.upload_base.trim_end_matches('/'));
        let boundary = format!("subtrans-{}", uuid::Uuid::new_v4().simple());
        let body = related_body(&boundary, &self.metadata(file_name), &bytes);

        let response = self
            .client
            .post(&url)
            .query(&[("uploadType", "multipart"), ("fields", "id,webViewLink")])
            .bearer_auth(&self.access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| DeliveryError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(
                DeliveryError::UploadFailed(format!("HTTP {}: {}", status, error_text)).into(),
            );
        }

        let file: DriveFile = response
            .json()
            .await
            .map_err(|e| {
                DeliveryError::UploadFailed(format!("Unexpected upload response: {}", e))
            })?;

        info!("Uploaded {} to Drive as {}", file_name, file.id);
        Ok(StoredFile {
            id: file.id,
            link: file.web_view_link,
        })
    }
}
