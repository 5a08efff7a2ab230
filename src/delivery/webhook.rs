use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{info, warn};

use super::{Delivery, NotificationReceipt, Notifier};
use crate::error::{DeliveryError, Result};

/// Posts translated files to an automation webhook as multipart form data
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

/// Extract the `drive_link` field, trimmed so it starts at its URL scheme.
fn extract_link(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let link = value.get("drive_link")?.as_str()?.trim();
    let link = link.find("http").map_or(link, |pos| &link[pos..]);
    (!link.is_empty()).then(|| link.to_string())
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, delivery: Delivery) -> Result<NotificationReceipt> {
        let file_part = Part::bytes(delivery.bytes)
            .file_name(delivery.file_name.clone())
            .mime_str("text/plain")
            .map_err(|e| DeliveryError::Notification(e.to_string()))?;

        let form = Form::new()
            .part("file", file_part)
            .text("file_name", delivery.file_name.clone())
            .text("target_language", delivery.target_language.clone())
            .text("user_email", delivery.recipient.clone());

        info!("Sending {} to delivery webhook", delivery.file_name);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Notification(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DeliveryError::Notification(format!("HTTP {}: {}", status, body)).into());
        }

        let link = extract_link(&body);
        if link.is_none() {
            warn!("The delivery webhook did not return a download link");
        }

        Ok(NotificationReceipt {
            link,
            delivered_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubtransError;
    use crate::test_support::spawn_stub;
    use axum::{Router, http::HeaderMap, http::StatusCode, routing::post};

    fn delivery() -> Delivery {
        Delivery {
            file_name: "French_intro.srt".to_string(),
            bytes: b"1\n00:00:01,000 --> 00:00:02,000\nSalut\n".to_vec(),
            target_language: "French".to_string(),
            recipient: "editor@example.com".to_string(),
        }
    }

    #[test]
    fn test_extract_link_trims_prefix() {
        assert_eq!(
            extract_link(r#"{"drive_link": " =https://drive.google.com/file/d/abc"}"#).as_deref(),
            Some("https://drive.google.com/file/d/abc")
        );
        assert_eq!(extract_link(r#"{"status": "ok"}"#), None);
        assert_eq!(extract_link("Accepted"), None);
    }

    #[tokio::test]
    async fn test_notify_posts_form_fields() {
        let app = Router::new().route(
            "/hook",
            post(|headers: HeaderMap, body: String| async move {
                let content_type = headers["content-type"].to_str().unwrap_or_default().to_string();
                assert!(content_type.starts_with("multipart/form-data"));
                let expected_parts = [
                    "name=\"file\"",
                    "French_intro.srt",
                    "name=\"user_email\"",
                    "editor@example.com",
                    "Salut",
                ];
                for expected in expected_parts {
                    assert!(body.contains(expected), "missing {}", expected);
                }
                r#"{"drive_link": "https://drive.google.com/file/d/xyz"}"#
            }),
        );
        let base = spawn_stub(app).await;

        let receipt = WebhookNotifier::new(format!("{}/hook", base))
            .unwrap()
            .notify(delivery())
            .await
            .unwrap();
        assert_eq!(receipt.link.as_deref(), Some("https://drive.google.com/file/d/xyz"));
    }

    #[tokio::test]
    async fn test_missing_link_is_not_an_error() {
        let app = Router::new().route("/hook", post(|| async { "Accepted" }));
        let base = spawn_stub(app).await;

        let receipt = WebhookNotifier::new(format!("{}/hook", base))
            .unwrap()
            .notify(delivery())
            .await
            .unwrap();
        assert!(receipt.link.is_none());
    }

    #[tokio::test]
    async fn test_rejected_notification_is_delivery_error() {
        let app = Router::new().route(
            "/hook",
            post(|| async { (StatusCode::BAD_GATEWAY, "scenario off") }),
        );
        let base = spawn_stub(app).await;

        let err = WebhookNotifier::new(format!("{}/hook", base))
            .unwrap()
            .notify(delivery())
            .await
            .unwrap_err();
        assert!(matches!(err, SubtransError::Delivery(DeliveryError::Notification(_))));
        assert!(err.is_delivery());
    }
}
