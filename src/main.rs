use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use dialogcast_backend::infrastructure::audio::{create_concatenator, AudioConcatenator};
use dialogcast_backend::infrastructure::config::{Config, LogFormat};
use dialogcast_backend::infrastructure::http::start_http_server;
use dialogcast_backend::infrastructure::storage::ArtifactStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting DialogCast Backend on {}:{}",
        config.host,
        config.port
    );

    // Prepare artifact directories
    let store = ArtifactStore::new(config.temp_dir.clone(), config.output_dir.clone());
    store.ensure_dirs().await?;
    tracing::info!(
        output_dir = %config.output_dir.display(),
        temp_dir = %config.temp_dir.display(),
        "Artifact directories ready"
    );

    // Check for Google credentials in environment (for debugging)
    tracing::info!(
        has_api_key = config.google_api_key.is_some(),
        has_access_token = config.google_access_token.is_some(),
        voice = %config.tts_voice_name,
        "Google TTS credentials check"
    );

    if config.google_api_key.is_none() && config.google_access_token.is_none() {
        tracing::warn!("No Google TTS credentials found (GOOGLE_API_KEY or GOOGLE_ACCESS_TOKEN). Synthesis requests will be rejected by the provider");
    }

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.synthesis_timeout_secs))
        .build()?;

    let config = Arc::new(config);
    let store = Arc::new(store);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories and collaborators
    tracing::info!("Instantiating repositories...");
    let tts_repo = Arc::new(dialogcast_backend::infrastructure::repositories::GoogleTtsRepository::new(
        http_client,
        config.google_tts_settings(),
    ));
    let concatenator: Arc<dyn AudioConcatenator> = Arc::from(create_concatenator(config.audio_concatenator, &config.ffmpeg_path));
    tracing::info!(concatenator = ?config.audio_concatenator, "Audio concatenator selected");

    // 2. Instantiate services (inject repositories and collaborators)
    tracing::info!("Instantiating services...");
    let orchestrator = Arc::new(dialogcast_backend::domain::dialogue::SynthesisOrchestrator::new(
        config.parser_dialect,
        config.planner_limits(),
        config.retry_policy(),
        tts_repo,
        concatenator,
        store,
        config.tts_cache_enabled,
    ));

    // 3. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let dialogue_controller = Arc::new(dialogcast_backend::controllers::dialogue::DialogueController::new(
        orchestrator.clone(),
        config.public_base_url.clone(),
        config.max_input_chars,
    ));

    // Start HTTP server with all routes
    start_http_server(config, orchestrator, dialogue_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "dialogcast_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "dialogcast_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
