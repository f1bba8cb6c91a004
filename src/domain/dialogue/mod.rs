pub mod dto;
pub mod error;
pub mod escalator;
pub mod model;
pub mod parser;
pub mod planner;
pub mod run_log;
pub mod service;
pub mod speaker;

pub use dto::{ProcessTextRequest, ProcessTextResponse};
pub use error::DialogueError;
pub use escalator::RetryEscalator;
pub use model::{AudioArtifact, Batch, DegradationLevel, FinalArtifact, Turn};
pub use parser::{DialogueParser, ParserDialect};
pub use planner::{ChunkPlanner, PlannerLimits};
pub use run_log::{LogEntry, RunLog};
pub use service::{RetryPolicy, SynthesisOrchestrator, SynthesisOrchestratorApi};
pub use speaker::SpeakerCode;
