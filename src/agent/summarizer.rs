//! Summarization stage: draft an answer grounded in the retrieved context

use crate::agent::prompts::SUMMARIZATION_SYSTEM_PROMPT;
use crate::agent::stage_agent::StageAgent;
use crate::agent::Stage;
use crate::errors::Result;
use crate::generation::GenerationCapability;
use crate::types::{Message, PipelineStage, QAState, StageUpdate};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// User message sent to the summarization agent
pub fn summarization_message(question: &str, context: &str) -> String {
    format!("Question: {}\n\nContext:\n{}", question, context)
}

pub struct Summarizer {
    agent: StageAgent,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn GenerationCapability>) -> Self {
        Self {
            agent: StageAgent::new(generator, SUMMARIZATION_SYSTEM_PROMPT),
        }
    }

    pub async fn summarize(&self, question: &str, context: &str) -> Result<String> {
        let input = vec![Message::user(summarization_message(question, context))];
        let output = self.agent.invoke(input).await?;
        let draft = output.last_assistant_content().to_string();

        debug!("Draft answer has {} chars", draft.len());
        Ok(draft)
    }
}

#[async_trait]
impl Stage for Summarizer {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Summarization
    }

    async fn run(&self, state: &QAState) -> Result<StageUpdate> {
        let context = state.require_context(PipelineStage::Summarization)?;
        let draft_answer = self.summarize(state.question(), context).await?;
        Ok(StageUpdate::Drafted { draft_answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarization_message() {
        assert_eq!(
            summarization_message("What is X?", "Chunk 1 (page=2): X is Y"),
            "Question: What is X?\n\nContext:\nChunk 1 (page=2): X is Y"
        );
    }
}
