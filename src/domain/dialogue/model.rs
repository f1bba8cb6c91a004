use super::speaker::SpeakerCode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fixed per-turn overhead of the `": "` separator between code and text
pub const SEPARATOR_OVERHEAD: usize = 2;

/// One speaker's contiguous utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: SpeakerCode,
    pub text: String,
}

impl Turn {
    pub fn new(speaker: SpeakerCode, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    /// Cost against the per-batch character budget
    pub fn char_cost(&self) -> usize {
        self.text.chars().count() + self.speaker.cost() + SEPARATOR_OVERHEAD
    }

    /// Cost against the provider's raw request-size ceiling
    pub fn byte_cost(&self) -> usize {
        self.text.len() + self.speaker.cost() + SEPARATOR_OVERHEAD
    }
}

/// Position of a batch on the retry degradation ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationLevel {
    Original,
    PunctuationStripped,
    SingleTurnSplit,
}

impl DegradationLevel {
    /// The next rung, or `None` once the terminal level is reached
    pub fn next(&self) -> Option<Self> {
        match self {
            DegradationLevel::Original => Some(DegradationLevel::PunctuationStripped),
            DegradationLevel::PunctuationStripped => Some(DegradationLevel::SingleTurnSplit),
            DegradationLevel::SingleTurnSplit => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DegradationLevel::Original => "original",
            DegradationLevel::PunctuationStripped => "punctuation_stripped",
            DegradationLevel::SingleTurnSplit => "single_turn_split",
        }
    }
}

impl std::fmt::Display for DegradationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A non-empty, ordered group of turns submitted in one synthesis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    turns: Vec<Turn>,
    level: DegradationLevel,
}

impl Batch {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self::with_level(turns, DegradationLevel::Original)
    }

    pub fn with_level(turns: Vec<Turn>, level: DegradationLevel) -> Self {
        debug_assert!(!turns.is_empty(), "a batch must hold at least one turn");
        Self { turns, level }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }

    pub fn level(&self) -> DegradationLevel {
        self.level
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn char_cost(&self) -> usize {
        self.turns.iter().map(Turn::char_cost).sum()
    }

    pub fn byte_cost(&self) -> usize {
        self.turns.iter().map(Turn::byte_cost).sum()
    }

    /// Content key identifying what the provider would be asked to speak
    pub fn fingerprint(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.speaker, turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-batch audio persisted in the run's temporary namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    /// Index of the planned batch this audio belongs to
    pub batch_index: usize,
    /// Position among the sub-batches an escalation produced
    pub sub_index: usize,
    pub path: PathBuf,
}

/// The concatenated narration, published to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub batch_count: usize,
    pub turn_count: usize,
}
