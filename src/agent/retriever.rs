//! Retrieval stage
//!
//! Fans out one retrieval agent call per sub-question, runs the tool calls
//! each reply requests, and merges the serialized passages into a single
//! context block.
//!
//! All sub-question tasks are joined before anything is merged, and the
//! merge follows submission order. A task finishing early never moves its
//! contribution ahead of an earlier sub-question.

use crate::agent::prompts::RETRIEVAL_SYSTEM_PROMPT;
use crate::agent::stage_agent::StageAgent;
use crate::agent::Stage;
use crate::errors::Result;
use crate::generation::GenerationCapability;
use crate::retrieval::RetrievalCapability;
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::tools::{RetrievalArgs, RetrievalTool, RETRIEVAL_TOOL_NAME};
use crate::types::{Message, PipelineStage, QAState, StageUpdate, ToolCall};
use async_trait::async_trait;
use futures_util::future::try_join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Context used when no tool call contributed anything
pub const NO_CONTEXT_FOUND: &str = "No context found.";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Join per-sub-question contributions in submission order
pub fn merge_contributions(per_sub_question: Vec<Vec<String>>) -> String {
    let all: Vec<String> = per_sub_question.into_iter().flatten().collect();
    if all.is_empty() {
        NO_CONTEXT_FOUND.to_string()
    } else {
        all.join(CONTEXT_SEPARATOR)
    }
}

/// Keep well-formed retrieval tool calls, in request order
fn retrieval_requests(tool_calls: &[ToolCall]) -> Vec<RetrievalArgs> {
    tool_calls
        .iter()
        .filter_map(|call| {
            if call.name != RETRIEVAL_TOOL_NAME {
                warn!("Skipping call to unknown tool '{}'", call.name);
                return None;
            }
            let args = RetrievalArgs::parse(&call.arguments);
            if args.is_none() {
                warn!(
                    "Skipping {} call without a string query: {}",
                    RETRIEVAL_TOOL_NAME, call.arguments
                );
            }
            args
        })
        .collect()
}

/// Retrieval stage
pub struct Retriever {
    agent: StageAgent,
    tool: RetrievalTool,
    telemetry: TelemetryCollector,
}

impl Retriever {
    pub fn new(
        generator: Arc<dyn GenerationCapability>,
        backend: Arc<dyn RetrievalCapability>,
        telemetry: TelemetryCollector,
    ) -> Self {
        let agent = StageAgent::new(generator, RETRIEVAL_SYSTEM_PROMPT)
            .with_tools(vec![RetrievalTool::schema()]);

        Self {
            agent,
            tool: RetrievalTool::new(backend),
            telemetry,
        }
    }

    /// Assemble context for all sub-questions
    ///
    /// Fails if any sub-question task fails; nothing is merged in that case.
    pub async fn retrieve(&self, sub_questions: &[String]) -> Result<String> {
        self.telemetry.record(TelemetryEvent::SubQuestionDispatch {
            count: sub_questions.len(),
            timestamp: Instant::now(),
        });

        let tasks = sub_questions.iter().map(|q| self.retrieve_one(q));
        let per_sub_question = try_join_all(tasks).await?;

        Ok(merge_contributions(per_sub_question))
    }

    /// Serialized passages contributed by one sub-question
    async fn retrieve_one(&self, sub_question: &str) -> Result<Vec<String>> {
        let input = vec![Message::user(format!("Retrieve context for: {}", sub_question))];
        let output = self.agent.invoke_async(input).await?;

        let requests = match output.last_message() {
            Some(reply) if reply.has_tool_calls() => retrieval_requests(&reply.tool_calls),
            _ => Vec::new(),
        };

        if requests.is_empty() {
            debug!("No retrieval requested for '{}'", sub_question);
            return Ok(Vec::new());
        }

        self.telemetry.record(TelemetryEvent::ToolDispatch {
            tool: RETRIEVAL_TOOL_NAME.to_string(),
            call_count: requests.len(),
            timestamp: Instant::now(),
        });

        let contents = try_join_all(requests.iter().map(|args| self.run_tool(args))).await?;
        debug!(
            "Sub-question '{}' contributed {} tool results",
            sub_question,
            contents.len()
        );
        Ok(contents)
    }

    /// One tool call; only the content channel feeds the context
    async fn run_tool(&self, args: &RetrievalArgs) -> Result<String> {
        let start = Instant::now();
        let result = self.tool.invoke(args).await;

        self.telemetry.record(TelemetryEvent::ToolCompleted {
            tool: RETRIEVAL_TOOL_NAME.to_string(),
            duration_ms: start.elapsed().as_millis() as u64,
            success: result.is_ok(),
            timestamp: Instant::now(),
        });

        result.map(|output| output.content)
    }
}

#[async_trait]
impl Stage for Retriever {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Retrieval
    }

    async fn run(&self, state: &QAState) -> Result<StageUpdate> {
        let context = self.retrieve(state.require_sub_questions()?).await?;
        Ok(StageUpdate::Retrieved { context })
    }
}
