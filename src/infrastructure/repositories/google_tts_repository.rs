use super::tts_repository::TtsRepository;
use crate::domain::dialogue::Batch;
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Voice and endpoint settings for Google Cloud Text-to-Speech
#[derive(Debug, Clone)]
pub struct GoogleTtsSettings {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub access_token: Option<String>,
    pub language_code: String,
    pub voice_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisInput<'a> {
    multi_speaker_markup: MultiSpeakerMarkup<'a>,
}

#[derive(Serialize)]
struct MultiSpeakerMarkup<'a> {
    turns: Vec<MarkupTurn<'a>>,
}

#[derive(Serialize)]
struct MarkupTurn<'a> {
    speaker: &'static str,
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

/// Google Cloud TTS implementation of TTS repository, using multi-speaker markup
pub struct GoogleTtsRepository {
    client: reqwest::Client,
    settings: GoogleTtsSettings,
}

impl GoogleTtsRepository {
    pub fn new(client: reqwest::Client, settings: GoogleTtsSettings) -> Self {
        Self { client, settings }
    }

    fn build_request<'a>(&'a self, batch: &'a Batch) -> SynthesizeRequest<'a> {
        SynthesizeRequest {
            input: SynthesisInput {
                multi_speaker_markup: MultiSpeakerMarkup {
                    turns: batch
                        .turns()
                        .iter()
                        .map(|turn| MarkupTurn {
                            speaker: turn.speaker.as_str(),
                            text: &turn.text,
                        })
                        .collect(),
                },
            },
            voice: VoiceSelection {
                language_code: &self.settings.language_code,
                name: &self.settings.voice_name,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        }
    }
}

#[async_trait]
impl TtsRepository for GoogleTtsRepository {
    async fn synthesize(&self, batch: &Batch) -> Result<Vec<u8>, String> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            voice = %self.settings.voice_name,
            language = %self.settings.language_code,
            turn_count = batch.len(),
            request_chars = batch.char_cost(),
            request_bytes = batch.byte_cost(),
            level = %batch.level(),
            "Calling Google TTS synthesize"
        );

        let mut request = self
            .client
            .post(&self.settings.endpoint)
            .json(&self.build_request(batch));

        if let Some(api_key) = &self.settings.api_key {
            request = request.query(&[("key", api_key)]);
        }
        if let Some(token) = &self.settings.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(error = %e, "Google TTS request failed");
            format!("Google TTS request error: {}", e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %body,
                turn_count = batch.len(),
                "Google TTS rejected synthesize request"
            );
            return Err(format!("Google TTS error {}: {}", status, body));
        }

        let payload: SynthesizeResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to decode Google TTS response");
            format!("Failed to decode Google TTS response: {}", e)
        })?;

        let audio = base64::engine::general_purpose::STANDARD
            .decode(&payload.audio_content)
            .map_err(|e| format!("Bad base64 in audioContent: {}", e))?;

        tracing::info!(
            provider = "google",
            latency_ms = start_time.elapsed().as_millis(),
            audio_size_bytes = audio.len(),
            "Google TTS synthesis completed"
        );

        Ok(audio)
    }

    fn is_configured(&self) -> bool {
        self.settings.api_key.is_some() || self.settings.access_token.is_some()
    }
}
