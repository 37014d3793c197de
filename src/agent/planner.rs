//! Planning stage
//!
//! Asks the planning agent for a search plan and splits the reply into the
//! plan text and a list of sub-questions. Parsing never fails: a reply
//! without usable sub-questions falls back to the original question.

use crate::agent::prompts::PLANNING_SYSTEM_PROMPT;
use crate::agent::stage_agent::StageAgent;
use crate::agent::Stage;
use crate::errors::Result;
use crate::generation::GenerationCapability;
use crate::types::{PipelineStage, QAState, StageUpdate};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

const PLAN_MARKER: &str = "Plan:";
const SUB_QUESTIONS_MARKER: &str = "Sub-questions:";

/// Parsed planner reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanOutcome {
    pub plan: String,
    pub sub_questions: Vec<String>,
}

/// Split a planner reply into plan and sub-questions
///
/// `plan` is the text between the first `Plan:` and the following
/// `Sub-questions:` marker, or `""` when there is no `Plan:` marker. Each
/// line after `Sub-questions:` loses its bullet dashes and surrounding
/// whitespace; lines left empty are dropped. With no sub-questions the
/// result is `[question]`.
pub fn parse_plan(response: &str, question: &str) -> PlanOutcome {
    let plan = response
        .split(PLAN_MARKER)
        .nth(1)
        .and_then(|after| after.split(SUB_QUESTIONS_MARKER).next())
        .map(|segment| segment.trim().to_string())
        .unwrap_or_default();

    let mut sub_questions: Vec<String> = response
        .split(SUB_QUESTIONS_MARKER)
        .nth(1)
        .map(|segment| {
            segment
                .lines()
                .map(|line| line.trim_matches(|c: char| c == '-' || c == ' ').trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if sub_questions.is_empty() {
        sub_questions.push(question.to_string());
    }

    PlanOutcome {
        plan,
        sub_questions,
    }
}

/// Planning stage
pub struct Planner {
    agent: StageAgent,
}

impl Planner {
    pub fn new(generator: Arc<dyn GenerationCapability>) -> Self {
        Self {
            agent: StageAgent::new(generator, PLANNING_SYSTEM_PROMPT),
        }
    }

    /// Plan the search for `question`
    pub async fn plan(&self, question: &str) -> Result<PlanOutcome> {
        let output = self.agent.invoke(question).await?;
        let outcome = parse_plan(output.last_assistant_content(), question);

        debug!(
            "Planned {} sub-questions: {:?}",
            outcome.sub_questions.len(),
            outcome.sub_questions
        );
        Ok(outcome)
    }
}

#[async_trait]
impl Stage for Planner {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Planning
    }

    async fn run(&self, state: &QAState) -> Result<StageUpdate> {
        let outcome = self.plan(state.question()).await?;
        Ok(StageUpdate::Planned {
            plan: outcome.plan,
            sub_questions: outcome.sub_questions,
        })
    }
}
