//! Stage agents and the pipeline that runs them
//!
//! Each stage wraps a [`StageAgent`] with its own system instruction and
//! turns the shared state into one [`StageUpdate`].

pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod retriever;
pub mod stage_agent;
pub mod summarizer;
pub mod verifier;

use crate::errors::Result;
use crate::types::{PipelineStage, QAState, StageUpdate};
use async_trait::async_trait;

// Re-export commonly used types
pub use orchestrator::QaPipeline;
pub use planner::{parse_plan, PlanOutcome, Planner};
pub use retriever::{merge_contributions, Retriever, NO_CONTEXT_FOUND};
pub use stage_agent::{AgentInput, AgentOutput, StageAgent};
pub use summarizer::Summarizer;
pub use verifier::Verifier;

/// One pipeline stage
///
/// A stage only reads fields written by earlier stages and reports its own
/// output as a [`StageUpdate`].
#[async_trait]
pub trait Stage: Send + Sync {
    /// Which stage this is
    fn stage(&self) -> PipelineStage;

    /// Produce this stage's update from the current state
    async fn run(&self, state: &QAState) -> Result<StageUpdate>;
}
