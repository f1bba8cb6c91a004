pub mod request_id;

use axum::{
    http::HeaderName,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::controllers::{dialogue::DialogueController, health};
use crate::domain::dialogue::SynthesisOrchestrator;
use crate::infrastructure::config::Config;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Build the application router with every route and layer
pub fn build_router(
    orchestrator: Arc<SynthesisOrchestrator>,
    dialogue_controller: Arc<DialogueController>,
) -> Router {
    // Narration routes
    let dialogue_routes = Router::new()
        .route("/process-text", post(DialogueController::process_text))
        .route("/download/:filename", get(DialogueController::download))
        .with_state(dialogue_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(orchestrator)
        .merge(dialogue_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers([HeaderName::from_static(X_REQUEST_ID)]),
        )
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    orchestrator: Arc<SynthesisOrchestrator>,
    dialogue_controller: Arc<DialogueController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(orchestrator, dialogue_controller);

    // Start server
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
