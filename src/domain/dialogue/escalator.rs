use super::model::{Batch, DegradationLevel, Turn};

/// Degradation ladder applied to a batch the provider rejected:
/// `Original -> PunctuationStripped -> SingleTurnSplit`.
pub struct RetryEscalator;

impl RetryEscalator {
    pub fn new() -> Self {
        Self
    }

    /// Replacement batches one rung further down the ladder, in dialogue order.
    ///
    /// Returns `None` once the batch is already at the terminal level.
    pub fn escalate(&self, batch: &Batch) -> Option<Vec<Batch>> {
        match batch.level() {
            DegradationLevel::Original => {
                let turns = batch.turns().iter().map(strip_punctuation).collect();
                Some(vec![Batch::with_level(
                    turns,
                    DegradationLevel::PunctuationStripped,
                )])
            }
            DegradationLevel::PunctuationStripped => Some(
                batch
                    .turns()
                    .iter()
                    .map(|turn| {
                        Batch::with_level(vec![turn.clone()], DegradationLevel::SingleTurnSplit)
                    })
                    .collect(),
            ),
            DegradationLevel::SingleTurnSplit => None,
        }
    }
}

impl Default for RetryEscalator {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep word characters and whitespace only. A turn left with nothing to say
/// keeps its original text.
fn strip_punctuation(turn: &Turn) -> Turn {
    let kept: String = turn
        .text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        turn.clone()
    } else {
        Turn::new(turn.speaker, collapsed)
    }
}
