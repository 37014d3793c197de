//! Verification stage: correct the draft against the context
//!
//! Terminal stage. Its output is the final answer.

use crate::agent::prompts::VERIFICATION_SYSTEM_PROMPT;
use crate::agent::stage_agent::StageAgent;
use crate::agent::Stage;
use crate::errors::Result;
use crate::generation::GenerationCapability;
use crate::types::{Message, PipelineStage, QAState, StageUpdate};
use async_trait::async_trait;
use std::sync::Arc;

/// User message sent to the verification agent
pub fn verification_message(question: &str, context: &str, draft_answer: &str) -> String {
    format!(
        "Question: {}\n\nContext:\n{}\n\nDraft Answer:\n{}\n\n\
         Please verify and correct the draft answer, removing any unsupported claims.",
        question, context, draft_answer
    )
}

pub struct Verifier {
    agent: StageAgent,
}

impl Verifier {
    pub fn new(generator: Arc<dyn GenerationCapability>) -> Self {
        Self {
            agent: StageAgent::new(generator, VERIFICATION_SYSTEM_PROMPT),
        }
    }

    pub async fn verify(&self, question: &str, context: &str, draft_answer: &str) -> Result<String> {
        let input = vec![Message::user(verification_message(
            question,
            context,
            draft_answer,
        ))];
        let output = self.agent.invoke(input).await?;
        Ok(output.last_assistant_content().to_string())
    }
}

#[async_trait]
impl Stage for Verifier {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Verification
    }

    async fn run(&self, state: &QAState) -> Result<StageUpdate> {
        let context = state.require_context(PipelineStage::Verification)?;
        let draft_answer = state.require_draft_answer()?;
        let answer = self.verify(state.question(), context, draft_answer).await?;
        Ok(StageUpdate::Verified { answer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_message() {
        let message = verification_message("Q?", "ctx", "draft");
        assert_eq!(
            message,
            "Question: Q?\n\nContext:\nctx\n\nDraft Answer:\ndraft\n\n\
             Please verify and correct the draft answer, removing any unsupported claims."
        );
    }
}
