//! Webhook listener: fetch a cloud file, translate it, upload the result.
//!
//! Started explicitly with `subtrans serve`; shuts down when its
//! cancellation token fires.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::delivery::FileStore;
use crate::error::{DeliveryError, Result, SubtransError};
use crate::pipeline::{Pipeline, webhook_output_name};
use crate::reassemble::Diagnostic;

/// Body of `POST /webhook`. Fields are optional so missing ones map to 400.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookRequest {
    pub file_id: Option<String>,
    pub file_name: Option<String>,
    pub target_language: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub job_id: Uuid,
    pub translated_file_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Shared server state.
#[derive(Clone)]
pub struct ServerState {
    pub pipeline: Arc<Pipeline>,
    pub store: Arc<dyn FileStore>,
    pub cancel: CancellationToken,
}

/// Webhook server.
pub struct WebhookServer {
    config: ServerConfig,
    state: ServerState,
}

impl WebhookServer {
    pub fn new(config: ServerConfig, state: ServerState) -> Self {
        Self { config, state }
    }

    /// Build the Axum router.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/webhook", post(handle_webhook))
            .route("/health", get(handle_health))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address and serve until cancelled.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.config.bind_address).await.map_err(|e| {
            SubtransError::Config(format!("Cannot bind {}: {}", self.config.bind_address, e))
        })?;
        self.run_on(listener).await
    }

    pub async fn run_on(self, listener: TcpListener) -> Result<()> {
        let router = self.router();
        let shutdown = self.state.cancel.clone();

        info!("Webhook listener starting on {}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Webhook listener stopped");
        Ok(())
    }
}

async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "status": "error", "message": message.into() })),
    )
        .into_response()
}

fn status_for(err: &SubtransError) -> StatusCode {
    match err {
        SubtransError::Delivery(DeliveryError::NotFound(_)) => StatusCode::NOT_FOUND,
        SubtransError::Delivery(DeliveryError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
        SubtransError::MalformedDocument { .. } | SubtransError::UnsupportedLanguage(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn handle_webhook(
    State(state): State<ServerState>,
    payload: std::result::Result<Json<WebhookRequest>, JsonRejection>,
) -> Response {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    let (Some(file_id), Some(file_name), Some(target_language)) = (
        non_empty(request.file_id),
        non_empty(request.file_name),
        non_empty(request.target_language),
    ) else {
        return error_body(StatusCode::BAD_REQUEST, "Missing required fields");
    };

    match process_job(&state, &file_id, &file_name, &target_language).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "job_id": outcome.job_id,
                "translated_file_id": outcome.translated_file_id,
                "link": outcome.link,
                "diagnostics": outcome.diagnostics,
            })),
        )
            .into_response(),
        Err(e) => {
            error!("Webhook job for {} failed: {}", file_id, e);
            error_body(status_for(&e), e.to_string())
        }
    }
}

/// Fetch, translate in memory and upload one file.
pub async fn process_job(
    state: &ServerState,
    file_id: &str,
    file_name: &str,
    target_language: &str,
) -> Result<JobOutcome> {
    let job_id = Uuid::new_v4();
    let language = state.pipeline.resolve_language(target_language)?;
    info!("Job {}: translating {} ({}) into {}", job_id, file_name, file_id, language);

    let source_bytes = state.store.fetch(file_id).await?;
    debug!("Job {}: fetched {} bytes", job_id, source_bytes.len());

    let reassembly = state
        .pipeline
        .translate_bytes(&source_bytes, &language, &state.cancel)
        .await?;

    let output_name = webhook_output_name(&language);
    let translated = reassembly.document.to_srt().into_bytes();

    let stored = state.store.upload(&output_name, translated).await?;
    info!("Job {}: uploaded {} as {}", job_id, output_name, stored.id);

    Ok(JobOutcome {
        job_id,
        translated_file_id: stored.id,
        link: stored.link,
        diagnostics: reassembly.diagnostics,
    })
}
