use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use crate::domain::dialogue::SynthesisOrchestrator;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(State(orchestrator): State<Arc<SynthesisOrchestrator>>) -> impl IntoResponse {
    let writable = orchestrator.store().check_writable().await;
    let configured = orchestrator.provider_configured();

    let status = if writable && configured {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ready" } else { "not_ready" },
            "output_dir": if writable { "writable" } else { "unwritable" },
            "tts": if configured { "configured" } else { "missing_credentials" }
        })),
    )
}
