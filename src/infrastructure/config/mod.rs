use crate::domain::dialogue::{ParserDialect, PlannerLimits, RetryPolicy};
use crate::infrastructure::audio::ConcatenatorKind;
use crate::infrastructure::repositories::GoogleTtsSettings;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_GOOGLE_TTS_ENDPOINT: &str =
    "https://texttospeech.googleapis.com/v1beta1/text:synthesize";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Storage
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub public_base_url: Option<String>,
    // Google Cloud TTS
    pub google_tts_endpoint: String,
    pub google_api_key: Option<String>,
    pub google_access_token: Option<String>,
    pub tts_language_code: String,
    pub tts_voice_name: String,
    // Chunking and retries
    pub max_chars: usize,
    pub max_bytes: usize,
    pub max_turns_per_batch: usize,
    pub retry_limit: usize,
    pub synthesis_timeout_secs: u64,
    pub synthesis_concurrency: usize,
    pub parser_dialect: ParserDialect,
    // Audio
    pub audio_concatenator: ConcatenatorKind,
    pub ffmpeg_path: String,
    // TTS Cache
    pub tts_cache_enabled: bool,
    pub max_input_chars: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process environment in production)
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Config {
            host: var("HOST", "0.0.0.0"),
            port: var("PORT", "8080").parse()?,
            environment: match var("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match var("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            output_dir: PathBuf::from(var("OUTPUT_DIR", "./output")),
            temp_dir: optional("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            public_base_url: optional("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            google_tts_endpoint: var("GOOGLE_TTS_ENDPOINT", DEFAULT_GOOGLE_TTS_ENDPOINT),
            google_api_key: optional("GOOGLE_API_KEY"),
            google_access_token: optional("GOOGLE_ACCESS_TOKEN"),
            tts_language_code: var("TTS_LANGUAGE_CODE", "en-US"),
            tts_voice_name: var("TTS_VOICE_NAME", "en-US-Studio-MultiSpeaker"),
            max_chars: var("MAX_CHARS", "2000").parse()?,
            max_bytes: var("MAX_BYTES", "5000").parse()?,
            max_turns_per_batch: var("MAX_TURNS_PER_BATCH", "3").parse()?,
            retry_limit: var("RETRY_LIMIT", "3").parse()?,
            synthesis_timeout_secs: var("SYNTHESIS_TIMEOUT_SECS", "60").parse()?,
            synthesis_concurrency: var("SYNTHESIS_CONCURRENCY", "1").parse()?,
            parser_dialect: var("PARSER_DIALECT", "lenient").parse()?,
            audio_concatenator: var("AUDIO_CONCATENATOR", "ffmpeg").parse()?,
            ffmpeg_path: var("FFMPEG_PATH", "ffmpeg"),
            tts_cache_enabled: var("TTS_CACHE_ENABLED", "false").to_lowercase() == "true",
            max_input_chars: var("MAX_INPUT_CHARS", "100000").parse()?,
        };

        if config.max_turns_per_batch == 0 || config.retry_limit == 0 {
            return Err("MAX_TURNS_PER_BATCH and RETRY_LIMIT must be at least 1".into());
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn planner_limits(&self) -> PlannerLimits {
        PlannerLimits {
            max_chars: self.max_chars,
            max_bytes: self.max_bytes,
            max_turns_per_batch: self.max_turns_per_batch,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retry_limit: self.retry_limit,
            attempt_timeout: Duration::from_secs(self.synthesis_timeout_secs),
            concurrency: self.synthesis_concurrency.max(1),
        }
    }

    pub fn google_tts_settings(&self) -> GoogleTtsSettings {
        GoogleTtsSettings {
            endpoint: self.google_tts_endpoint.clone(),
            api_key: self.google_api_key.clone(),
            access_token: self.google_access_token.clone(),
            language_code: self.tts_language_code.clone(),
            voice_name: self.tts_voice_name.clone(),
        }
    }
}
