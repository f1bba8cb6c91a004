use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::dialogue::{
        ProcessTextRequest, ProcessTextResponse, RunLog, SynthesisOrchestrator,
        SynthesisOrchestratorApi,
    },
    error::{AppError, AppResult, LoggedError},
    infrastructure::{http::RequestId, storage::is_safe_file_name},
};

pub struct DialogueController {
    orchestrator: Arc<SynthesisOrchestrator>,
    public_base_url: Option<String>,
    max_input_chars: usize,
}

impl DialogueController {
    pub fn new(
        orchestrator: Arc<SynthesisOrchestrator>,
        public_base_url: Option<String>,
        max_input_chars: usize,
    ) -> Self {
        Self {
            orchestrator,
            public_base_url,
            max_input_chars,
        }
    }

    /// POST /process-text - Narrate a two-speaker script
    pub async fn process_text(
        State(controller): State<Arc<DialogueController>>,
        Extension(request_id): Extension<RequestId>,
        headers: HeaderMap,
        payload: Result<Json<ProcessTextRequest>, JsonRejection>,
    ) -> Result<Json<ProcessTextResponse>, LoggedError> {
        let log = RunLog::new(Uuid::new_v4());

        let request = match payload {
            Ok(Json(request)) => request,
            Err(rejection) => {
                let message = format!("Invalid request body: {}", rejection.body_text());
                log.error(message.clone());
                return Err(AppError::BadRequest(message).with_logs(log.render()));
            }
        };

        tracing::info!(
            request_id = %request_id.0,
            run_id = %log.run_id(),
            text_chars = request.text.chars().count(),
            "Narration requested"
        );

        // Validate input
        if request.text.trim().is_empty() {
            log.error("No valid text input provided.");
            return Err(AppError::BadRequest("No valid text input provided.".to_string())
                .with_logs(log.render()));
        }

        if request.text.chars().count() > controller.max_input_chars {
            log.error(format!(
                "Text exceeds the {} character limit",
                controller.max_input_chars
            ));
            return Err(AppError::PayloadTooLarge(format!(
                "Text must be {} characters or less",
                controller.max_input_chars
            ))
            .with_logs(log.render()));
        }

        let artifact = match controller.orchestrator.run(&request.text, &log).await {
            Ok(artifact) => artifact,
            Err(e) => return Err(AppError::from(e).with_logs(log.render())),
        };

        let audio_url = format!(
            "{}/download/{}",
            controller.base_url(&headers),
            urlencoding::encode(&artifact.file_name)
        );
        log.info(format!("Audio URL: {}", audio_url));

        Ok(Json(ProcessTextResponse {
            audio_url,
            logs: log.render(),
        }))
    }

    /// GET /download/:filename - Fetch a published narration
    pub async fn download(
        State(controller): State<Arc<DialogueController>>,
        Path(filename): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        if !is_safe_file_name(&filename) {
            return Err(AppError::BadRequest(format!("Invalid file name: {}", filename)));
        }

        let path = controller
            .orchestrator
            .store()
            .resolve_download(&filename)
            .await
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        let audio = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read {}: {}", path.display(), e)))?;

        let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
            .map_err(|e| AppError::Internal(e.to_string()))?;

        // Build headers
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
        headers.insert(header::CONTENT_DISPOSITION, disposition);

        Ok((StatusCode::OK, headers, Body::from(audio)))
    }

    /// Scheme and authority the download link is built on
    fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(base) = &self.public_base_url {
            return base.clone();
        }

        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok());
        let scheme = headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("http");

        match host {
            Some(host) => format!("{}://{}", scheme, host),
            None => String::new(),
        }
    }
}
