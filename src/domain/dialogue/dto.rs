use serde::{Deserialize, Serialize};

/// Request for POST /process-text
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessTextRequest {
    #[serde(default)]
    pub text: String,
}

/// Response for POST /process-text
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessTextResponse {
    #[serde(rename = "audioUrl")]
    pub audio_url: String,
    pub logs: String,
}
