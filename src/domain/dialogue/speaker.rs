use serde::{Deserialize, Serialize};

/// Speaker identifiers accepted by the multi-speaker synthesis voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeakerCode {
    #[serde(rename = "R")]
    R,
    #[serde(rename = "S")]
    S,
}

impl SpeakerCode {
    /// Get the provider code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeakerCode::R => "R",
            SpeakerCode::S => "S",
        }
    }

    /// Map the number of a "Speaker N" label to its code.
    ///
    /// Returns `None` for speakers the voice has no slot for; callers treat
    /// that as an explicit skip of the line.
    pub fn from_speaker_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(SpeakerCode::R),
            2 => Some(SpeakerCode::S),
            _ => None,
        }
    }

    /// Length of the code as counted against the request budget
    pub fn cost(&self) -> usize {
        self.as_str().len()
    }
}

impl std::fmt::Display for SpeakerCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
