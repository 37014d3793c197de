//! Deterministic backends shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ikms::agent::prompts::{
    PLANNING_SYSTEM_PROMPT, RETRIEVAL_SYSTEM_PROMPT, SUMMARIZATION_SYSTEM_PROMPT,
    VERIFICATION_SYSTEM_PROMPT,
};
use ikms::errors::{QaError, Result};
use ikms::generation::GenerationCapability;
use ikms::retrieval::{Passage, RetrievalCapability};
use ikms::tools::{ToolSchema, RETRIEVAL_TOOL_NAME};
use ikms::types::{Message, ToolCall};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

const RETRIEVE_PREFIX: &str = "Retrieve context for: ";

/// Generator that plays all four stages
///
/// - Planning: replies with a fixed planner text
/// - Retrieval: one `retrieval_tool` call per sub-question, query = sub-question
/// - Summarization: restates every chunk and adds one unsupported sentence
/// - Verification: keeps only sentences found verbatim in the context
///
/// A faithful generator restates chunks only and verifies by passing the
/// draft through unchanged.
pub struct GroundedGenerator {
    planner_reply: String,
    retrieval_calls: bool,
    faithful: bool,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl GroundedGenerator {
    pub fn new(planner_reply: impl Into<String>) -> Self {
        Self {
            planner_reply: planner_reply.into(),
            retrieval_calls: true,
            faithful: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Retrieval replies carry no tool calls
    pub fn without_tool_calls(mut self) -> Self {
        self.retrieval_calls = false;
        self
    }

    /// Draft adds nothing beyond the context; verification returns it as is
    pub fn faithful(mut self) -> Self {
        self.faithful = true;
        self
    }

    /// User messages seen under a given system instruction
    pub fn user_messages_for(&self, system_prompt: &str) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|conv| conv.first().map(|m| m.content.as_str()) == Some(system_prompt))
            .filter_map(|conv| conv.get(1).map(|m| m.content.clone()))
            .collect()
    }
}

pub const UNSUPPORTED_CLAIM: &str = "Vector databases were invented on the moon";

fn section<'a>(text: &'a str, start: &str, end: Option<&str>) -> &'a str {
    let after = text.split_once(start).map(|(_, rest)| rest).unwrap_or("");
    match end {
        Some(end) => after.split_once(end).map(|(s, _)| s).unwrap_or(after),
        None => after,
    }
}

fn sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl GenerationCapability for GroundedGenerator {
    async fn generate(&self, messages: &[Message], _tools: &[ToolSchema]) -> Result<Message> {
        self.seen.lock().unwrap().push(messages.to_vec());

        let system = messages.first().map(|m| m.content.as_str()).unwrap_or("");
        let user = messages.get(1).map(|m| m.content.as_str()).unwrap_or("");

        let reply = if system == PLANNING_SYSTEM_PROMPT {
            Message::assistant(self.planner_reply.clone())
        } else if system == RETRIEVAL_SYSTEM_PROMPT {
            let query = user.strip_prefix(RETRIEVE_PREFIX).unwrap_or(user);
            let calls = if self.retrieval_calls {
                vec![ToolCall::new(RETRIEVAL_TOOL_NAME, json!({ "query": query }))]
            } else {
                Vec::new()
            };
            Message::assistant("").with_tool_calls(calls)
        } else if system == SUMMARIZATION_SYSTEM_PROMPT {
            let context = section(user, "Context:\n", None);
            let facts: Vec<String> = context
                .lines()
                .filter_map(|line| line.split_once("): ").map(|(_, fact)| fact))
                .map(|fact| format!("{}.", fact.trim_end_matches('.')))
                .collect();
            if self.faithful {
                Message::assistant(facts.join(" "))
            } else {
                Message::assistant(format!("{} {}.", facts.join(" "), UNSUPPORTED_CLAIM))
            }
        } else if system == VERIFICATION_SYSTEM_PROMPT && self.faithful {
            let draft = section(user, "Draft Answer:\n", Some("\n\nPlease verify"));
            Message::assistant(draft)
        } else if system == VERIFICATION_SYSTEM_PROMPT {
            let context = section(user, "Context:\n", Some("\n\nDraft Answer:\n"));
            let draft = section(user, "Draft Answer:\n", Some("\n\nPlease verify"));
            let kept: Vec<String> = sentences(draft)
                .into_iter()
                .filter(|s| context.contains(s.as_str()))
                .collect();
            Message::assistant(format!("{}.", kept.join(". ")))
        } else {
            return Err(QaError::GenerationError(format!(
                "unexpected system prompt: {}",
                system
            )));
        };

        Ok(reply)
    }
}

/// Retrieval backend over a fixed query -> passages table
///
/// Queries can be delayed to force a completion order; completed queries are
/// recorded in the order they finished.
#[derive(Default)]
pub struct FixtureRetriever {
    passages: HashMap<String, Vec<Passage>>,
    delays: HashMap<String, Duration>,
    barrier: Option<Arc<Barrier>>,
    completed: Mutex<Vec<String>>,
}

impl FixtureRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_passages(mut self, query: &str, passages: Vec<Passage>) -> Self {
        self.passages.insert(query.to_string(), passages);
        self
    }

    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    /// Every search waits until `parties` searches are in flight
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetrievalCapability for FixtureRetriever {
    async fn search(&self, query: &str, k: Option<usize>) -> Result<Vec<Passage>> {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }

        let mut passages = self.passages.get(query).cloned().unwrap_or_default();
        if let Some(k) = k {
            passages.truncate(k);
        }

        self.completed.lock().unwrap().push(query.to_string());
        Ok(passages)
    }
}

/// Retrieval backend that is always down
pub struct FailingRetriever;

#[async_trait]
impl RetrievalCapability for FailingRetriever {
    async fn search(&self, query: &str, _k: Option<usize>) -> Result<Vec<Passage>> {
        Err(QaError::RetrievalError(format!(
            "connection refused while searching '{}'",
            query
        )))
    }
}

/// Planner reply with the given sub-questions
pub fn planner_reply(plan: &str, sub_questions: &[&str]) -> String {
    let bullets: Vec<String> = sub_questions.iter().map(|q| format!("- {}", q)).collect();
    format!("Plan: {}\n\nSub-questions:\n{}", plan, bullets.join("\n"))
}
