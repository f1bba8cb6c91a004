use super::error::DialogueError;
use super::escalator::RetryEscalator;
use super::model::{AudioArtifact, Batch, FinalArtifact};
use super::parser::{DialogueParser, ParserDialect};
use super::planner::{ChunkPlanner, PlannerLimits};
use super::run_log::RunLog;
use crate::infrastructure::audio::AudioConcatenator;
use crate::infrastructure::repositories::TtsRepository;
use crate::infrastructure::storage::{ArtifactStore, RunArtifacts};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use moka::future::Cache;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How hard a batch is retried before the run gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per batch, escalations included.
    ///
    /// The degradation ladder has three rungs and a batch at the last rung is
    /// not retried, so values above 3 do not add attempts.
    pub retry_limit: usize,
    /// Deadline for a single provider call
    pub attempt_timeout: Duration,
    /// Planned batches resolved at the same time; 1 means strictly sequential
    pub concurrency: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            attempt_timeout: Duration::from_secs(60),
            concurrency: 1,
        }
    }
}

pub struct SynthesisOrchestrator {
    parser: DialogueParser,
    planner: ChunkPlanner,
    escalator: RetryEscalator,
    policy: RetryPolicy,
    tts_repo: Arc<dyn TtsRepository>,
    concatenator: Arc<dyn AudioConcatenator>,
    store: Arc<ArtifactStore>,
    cache: Option<Cache<String, Arc<Vec<u8>>>>,
}

impl SynthesisOrchestrator {
    pub fn new(
        dialect: ParserDialect,
        limits: PlannerLimits,
        policy: RetryPolicy,
        tts_repo: Arc<dyn TtsRepository>,
        concatenator: Arc<dyn AudioConcatenator>,
        store: Arc<ArtifactStore>,
        cache_enabled: bool,
    ) -> Self {
        // Keyed by exact batch content
        let cache = if cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(500)
                    .time_to_idle(Duration::from_secs(30 * 60))
                    .build(),
            )
        } else {
            None
        };

        Self {
            parser: DialogueParser::new(dialect),
            planner: ChunkPlanner::new(limits),
            escalator: RetryEscalator::new(),
            policy,
            tts_repo,
            concatenator,
            store,
            cache,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn provider_configured(&self) -> bool {
        self.tts_repo.is_configured()
    }
}

#[async_trait]
pub trait SynthesisOrchestratorApi: Send + Sync {
    /// Narrate a two-speaker script into a single audio file
    ///
    /// This operation:
    /// - Parses and plans the script (failing before any provider call)
    /// - Synthesizes every batch, degrading rejected batches
    /// - Concatenates the audio in dialogue order and publishes it
    ///
    /// Every step is recorded in `log`, which the caller keeps after the run
    async fn run(&self, raw_text: &str, log: &RunLog) -> Result<FinalArtifact, DialogueError>;
}

#[async_trait]
impl SynthesisOrchestratorApi for SynthesisOrchestrator {
    async fn run(&self, raw_text: &str, log: &RunLog) -> Result<FinalArtifact, DialogueError> {
        if raw_text.trim().is_empty() {
            return Err(DialogueError::InvalidInput(
                "No valid text input provided.".to_string(),
            ));
        }

        log.info(format!(
            "Text input received: {}...",
            raw_text.chars().take(100).collect::<String>()
        ));

        // 1. Parse and plan; nothing has been sent to the provider yet
        let turns = self.parser.parse(raw_text, log)?;
        let batches = self.planner.plan(&turns, log)?;

        // 2. Synthesize, concatenate and publish inside the run's scratch namespace
        let run = self.store.begin_run(log.run_id()).await?;
        let result = self.narrate(&run, batches, turns.len(), log).await;

        // 3. Scratch files go on both paths
        self.cleanup(&run, log).await;

        match &result {
            Ok(artifact) => log.info(format!(
                "Narration ready: {} ({} chunks, {} turns)",
                artifact.file_name, artifact.batch_count, artifact.turn_count
            )),
            Err(e) => log.error(format!("Narration failed: {}", e)),
        }

        result
    }
}

impl SynthesisOrchestrator {
    async fn narrate(
        &self,
        run: &RunArtifacts,
        batches: Vec<Batch>,
        turn_count: usize,
        log: &RunLog,
    ) -> Result<FinalArtifact, DialogueError> {
        let total = batches.len();

        // Ordered fan-out/fan-in: `buffered` yields in planned order whatever
        // the completion order, and stops submitting after the first error
        let resolved: Vec<Vec<AudioArtifact>> = futures::stream::iter(batches.into_iter().enumerate())
            .map(|(index, batch)| self.resolve_batch(index, total, batch, run, log))
            .buffered(self.policy.concurrency.max(1))
            .try_collect()
            .await?;

        let artifacts: Vec<AudioArtifact> = resolved.into_iter().flatten().collect();
        let inputs: Vec<PathBuf> = artifacts.iter().map(|a| a.path.clone()).collect();
        let target = run.concat_target();

        log.info(format!(
            "Concatenating {} audio chunks ({})",
            inputs.len(),
            self.concatenator.name()
        ));
        self.concatenator
            .concatenate(&inputs, &target)
            .await
            .map_err(|e| DialogueError::Concatenation(format!("{:#}", e)))?;
        log.info("Audio concatenation successful.");

        let file_name = format!("narration_{}.mp3", log.run_id());
        let path = self.store.publish(&target, &file_name).await?;

        Ok(FinalArtifact {
            file_name,
            path,
            batch_count: artifacts.len(),
            turn_count,
        })
    }

    /// Synthesize one planned batch, walking the degradation ladder on failure.
    ///
    /// Sub-batches produced by a split run right after the one being retried
    /// and share the attempts already spent on it.
    async fn resolve_batch(
        &self,
        index: usize,
        total: usize,
        batch: Batch,
        run: &RunArtifacts,
        log: &RunLog,
    ) -> Result<Vec<AudioArtifact>, DialogueError> {
        log.info(format!("Processing chunk {}/{}", index + 1, total));

        let mut pending: VecDeque<(Batch, usize)> = VecDeque::from([(batch, 0)]);
        let mut artifacts = Vec::new();

        while let Some((mut current, mut attempts)) = pending.pop_front() {
            loop {
                attempts += 1;
                log.info(format!(
                    "Attempt {} for chunk {} ({} turns, {})",
                    attempts,
                    index + 1,
                    current.len(),
                    current.level()
                ));

                let cause = match self.synthesize_once(&current).await {
                    Ok(audio) => {
                        let artifact = run.write_chunk(index, artifacts.len(), &audio).await?;
                        log.info(format!(
                            "Audio chunk {} written to {}",
                            index + 1,
                            artifact.path.display()
                        ));
                        artifacts.push(artifact);
                        break;
                    }
                    Err(cause) => cause,
                };

                log.error(format!(
                    "Retry {} for chunk {} failed: {}",
                    attempts,
                    index + 1,
                    cause
                ));

                if attempts >= self.policy.retry_limit {
                    return Err(DialogueError::BatchSynthesisExhausted {
                        batch_index: index,
                        level: current.level(),
                        cause,
                    });
                }

                let mut replacements = match self.escalator.escalate(&current) {
                    Some(replacements) => replacements.into_iter(),
                    None => {
                        return Err(DialogueError::BatchSynthesisExhausted {
                            batch_index: index,
                            level: current.level(),
                            cause,
                        })
                    }
                };
                let Some(first) = replacements.next() else {
                    return Err(DialogueError::BatchSynthesisExhausted {
                        batch_index: index,
                        level: current.level(),
                        cause,
                    });
                };

                let siblings: Vec<Batch> = replacements.collect();
                log.warn(format!(
                    "Chunk {} degraded from {} to {} ({} sub-chunks)",
                    index + 1,
                    current.level(),
                    first.level(),
                    siblings.len() + 1
                ));
                for (offset, sibling) in siblings.into_iter().enumerate() {
                    pending.insert(offset, (sibling, attempts));
                }
                current = first;
            }
        }

        Ok(artifacts)
    }

    /// One provider call under the per-attempt deadline
    async fn synthesize_once(&self, batch: &Batch) -> Result<Arc<Vec<u8>>, String> {
        let key = self.cache.as_ref().map(|_| batch.fingerprint());

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(audio) = cache.get(key).await {
                tracing::info!(audio_size = audio.len(), "Synthesis cache hit");
                return Ok(audio);
            }
        }

        let audio = match tokio::time::timeout(
            self.policy.attempt_timeout,
            self.tts_repo.synthesize(batch),
        )
        .await
        {
            Ok(Ok(audio)) => Arc::new(audio),
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(format!(
                    "synthesis exceeded the {:?} deadline",
                    self.policy.attempt_timeout
                ))
            }
        };

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.insert(key, audio.clone()).await;
        }

        Ok(audio)
    }

    async fn cleanup(&self, run: &RunArtifacts, log: &RunLog) {
        let written = run.written().len();
        for (path, cause) in run.cleanup().await {
            let err = DialogueError::ArtifactCleanup { path, cause };
            log.warn(err.to_string());
        }
        log.debug(format!("Removed {} temporary audio chunks", written));
    }
}
