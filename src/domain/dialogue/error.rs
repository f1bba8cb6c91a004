use super::model::DegradationLevel;
use super::speaker::SpeakerCode;
use crate::error::AppError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no valid dialogue structure found in input text")]
    NoDialogueFound,
    #[error("no turns to plan")]
    EmptyInput,
    #[error(
        "turn for speaker {speaker} contains a word of {word_chars} characters, \
         longer than the {budget} characters allowed per request"
    )]
    UnsplittableTurn {
        speaker: SpeakerCode,
        word_chars: usize,
        budget: usize,
    },
    #[error("failed to synthesize chunk {} at level {level}: {cause}", .batch_index + 1)]
    BatchSynthesisExhausted {
        batch_index: usize,
        level: DegradationLevel,
        cause: String,
    },
    #[error("error concatenating audio files: {0}")]
    Concatenation(String),
    #[error("failed to remove temporary artifact {}: {cause}", .path.display())]
    ArtifactCleanup { path: PathBuf, cause: String },
    #[error("artifact storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<DialogueError> for AppError {
    fn from(err: DialogueError) -> Self {
        match err {
            DialogueError::InvalidInput(_)
            | DialogueError::NoDialogueFound
            | DialogueError::EmptyInput
            | DialogueError::UnsplittableTurn { .. } => AppError::BadRequest(err.to_string()),
            DialogueError::BatchSynthesisExhausted { .. } | DialogueError::Concatenation(_) => {
                AppError::ExternalService(err.to_string())
            }
            DialogueError::ArtifactCleanup { .. } | DialogueError::Storage(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
