use super::error::DialogueError;
use super::model::{Batch, Turn, SEPARATOR_OVERHEAD};
use super::run_log::RunLog;

/// Size ceilings a single synthesis request has to respect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerLimits {
    /// Character budget per request (text + speaker code + separator, summed over turns)
    pub max_chars: usize,
    /// Provider's hard request-size ceiling, in bytes
    pub max_bytes: usize,
    /// Provider's hard ceiling on turns per request
    pub max_turns_per_batch: usize,
}

impl Default for PlannerLimits {
    fn default() -> Self {
        Self {
            max_chars: 2000,
            max_bytes: 5000,
            max_turns_per_batch: 3,
        }
    }
}

/// Packs turns into provider-sized batches.
///
/// Two passes: a greedy pack against the character budget, where a turn too
/// large for any request is split on word boundaries into single-turn batches,
/// then a re-split of every batch against the byte and turn-count caps.
pub struct ChunkPlanner {
    limits: PlannerLimits,
}

impl ChunkPlanner {
    pub fn new(limits: PlannerLimits) -> Self {
        Self { limits }
    }

    pub fn plan(&self, turns: &[Turn], log: &RunLog) -> Result<Vec<Batch>, DialogueError> {
        if turns.is_empty() {
            return Err(DialogueError::EmptyInput);
        }

        let mut batches = Vec::new();
        let mut current: Vec<Turn> = Vec::new();
        let mut current_chars = 0;

        for turn in turns {
            if self.is_oversized(turn) {
                if !current.is_empty() {
                    batches.push(Batch::new(std::mem::take(&mut current)));
                    current_chars = 0;
                }

                let fragments = self.split_turn(turn)?;
                log.info(format!(
                    "Turn for speaker {} is {} characters, over the per-request budget; split into {} parts",
                    turn.speaker,
                    turn.char_cost(),
                    fragments.len()
                ));
                batches.extend(fragments.into_iter().map(|fragment| Batch::new(vec![fragment])));
                continue;
            }

            let cost = turn.char_cost();
            if current_chars + cost <= self.limits.max_chars {
                current.push(turn.clone());
                current_chars += cost;
            } else {
                batches.push(Batch::new(std::mem::take(&mut current)));
                current.push(turn.clone());
                current_chars = cost;
            }
        }

        if !current.is_empty() {
            batches.push(Batch::new(current));
        }

        let batches: Vec<Batch> = batches
            .into_iter()
            .flat_map(|batch| self.enforce_request_cap(batch))
            .collect();

        log.info(format!(
            "Split input into {} chunks (max {} chars, {} bytes, {} turns per chunk)",
            batches.len(),
            self.limits.max_chars,
            self.limits.max_bytes,
            self.limits.max_turns_per_batch
        ));
        for (index, batch) in batches.iter().enumerate() {
            log.debug(format!(
                "Chunk {}: {} turns, {} chars, {} bytes",
                index + 1,
                batch.len(),
                batch.char_cost(),
                batch.byte_cost()
            ));
        }

        Ok(batches)
    }

    fn is_oversized(&self, turn: &Turn) -> bool {
        turn.char_cost() > self.limits.max_chars || turn.byte_cost() > self.limits.max_bytes
    }

    /// Break one turn into whole-word fragments that each fit a request on their own
    fn split_turn(&self, turn: &Turn) -> Result<Vec<Turn>, DialogueError> {
        let overhead = turn.speaker.cost() + SEPARATOR_OVERHEAD;
        let char_budget = self.limits.max_chars.saturating_sub(overhead);
        let byte_budget = self.limits.max_bytes.saturating_sub(overhead);

        let mut fragments = Vec::new();
        let mut words: Vec<&str> = Vec::new();
        let mut chars = 0;
        let mut bytes = 0;

        for word in turn.text.split_whitespace() {
            let word_chars = word.chars().count();
            let word_bytes = word.len();
            if word_chars > char_budget || word_bytes > byte_budget {
                return Err(DialogueError::UnsplittableTurn {
                    speaker: turn.speaker,
                    word_chars,
                    budget: char_budget,
                });
            }

            let separator = usize::from(!words.is_empty());
            if chars + separator + word_chars <= char_budget
                && bytes + separator + word_bytes <= byte_budget
            {
                words.push(word);
                chars += separator + word_chars;
                bytes += separator + word_bytes;
            } else {
                fragments.push(Turn::new(turn.speaker, words.join(" ")));
                words = vec![word];
                chars = word_chars;
                bytes = word_bytes;
            }
        }

        if !words.is_empty() {
            fragments.push(Turn::new(turn.speaker, words.join(" ")));
        }

        Ok(fragments)
    }

    /// Re-split a batch that breaks the provider's byte or turn-count cap
    fn enforce_request_cap(&self, batch: Batch) -> Vec<Batch> {
        if batch.len() <= self.limits.max_turns_per_batch
            && batch.byte_cost() <= self.limits.max_bytes
        {
            return vec![batch];
        }

        let mut batches = Vec::new();
        let mut current: Vec<Turn> = Vec::new();
        let mut current_bytes = 0;

        for turn in batch.into_turns() {
            let cost = turn.byte_cost();
            if !current.is_empty()
                && (current_bytes + cost > self.limits.max_bytes
                    || current.len() >= self.limits.max_turns_per_batch)
            {
                batches.push(Batch::new(std::mem::take(&mut current)));
                current_bytes = 0;
            }
            current_bytes += cost;
            current.push(turn);
        }

        if !current.is_empty() {
            batches.push(Batch::new(current));
        }

        batches
    }
}
