//! Pipeline state threaded through the four stages
//!
//! Each [`QAState`] field has exactly one writer stage and is written once:
//! - `plan`, `sub_questions`: Planning
//! - `context`: Retrieval
//! - `draft_answer`: Summarization
//! - `answer`: Verification
//!
//! Stages never touch the state directly. They return a [`StageUpdate`] and
//! the orchestrator merges it with [`QAState::apply`], which rejects updates
//! arriving out of order or twice.

use crate::errors::{QaError, Result};
use serde::{Deserialize, Serialize};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Planning,
    Retrieval,
    Summarization,
    Verification,
    /// All fields written (terminal)
    Complete,
}

impl PipelineStage {
    /// Stages that do work, in order
    pub const ORDER: [PipelineStage; 4] = [
        PipelineStage::Planning,
        PipelineStage::Retrieval,
        PipelineStage::Summarization,
        PipelineStage::Verification,
    ];

    /// Stage that runs after this one
    pub fn next(&self) -> PipelineStage {
        match self {
            PipelineStage::Planning => PipelineStage::Retrieval,
            PipelineStage::Retrieval => PipelineStage::Summarization,
            PipelineStage::Summarization => PipelineStage::Verification,
            PipelineStage::Verification | PipelineStage::Complete => PipelineStage::Complete,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Complete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Planning => "planning",
            PipelineStage::Retrieval => "retrieval",
            PipelineStage::Summarization => "summarization",
            PipelineStage::Verification => "verification",
            PipelineStage::Complete => "complete",
        }
    }

    /// Human-readable stage name
    pub fn display_name(&self) -> &'static str {
        match self {
            PipelineStage::Planning => "Planning sub-questions",
            PipelineStage::Retrieval => "Retrieving context",
            PipelineStage::Summarization => "Drafting answer",
            PipelineStage::Verification => "Verifying answer",
            PipelineStage::Complete => "Completed",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level output of one stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageUpdate {
    Planned {
        plan: String,
        sub_questions: Vec<String>,
    },
    Retrieved {
        context: String,
    },
    Drafted {
        draft_answer: String,
    },
    Verified {
        answer: String,
    },
}

impl StageUpdate {
    /// Stage that produces this update
    pub fn stage(&self) -> PipelineStage {
        match self {
            StageUpdate::Planned { .. } => PipelineStage::Planning,
            StageUpdate::Retrieved { .. } => PipelineStage::Retrieval,
            StageUpdate::Drafted { .. } => PipelineStage::Summarization,
            StageUpdate::Verified { .. } => PipelineStage::Verification,
        }
    }
}

/// Shared state for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QAState {
    question: String,
    plan: Option<String>,
    sub_questions: Option<Vec<String>>,
    context: Option<String>,
    draft_answer: Option<String>,
    answer: Option<String>,
}

impl QAState {
    /// Fresh state with only the question populated
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            plan: None,
            sub_questions: None,
            context: None,
            draft_answer: None,
            answer: None,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn plan(&self) -> Option<&str> {
        self.plan.as_deref()
    }

    pub fn sub_questions(&self) -> Option<&[String]> {
        self.sub_questions.as_deref()
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn draft_answer(&self) -> Option<&str> {
        self.draft_answer.as_deref()
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// First stage whose output has not been written yet
    pub fn pending_stage(&self) -> PipelineStage {
        if self.sub_questions.is_none() {
            PipelineStage::Planning
        } else if self.context.is_none() {
            PipelineStage::Retrieval
        } else if self.draft_answer.is_none() {
            PipelineStage::Summarization
        } else if self.answer.is_none() {
            PipelineStage::Verification
        } else {
            PipelineStage::Complete
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pending_stage().is_terminal()
    }

    /// Merge one stage's output into the state
    ///
    /// Fails with [`QaError::InvalidTransition`] when the update does not
    /// belong to the pending stage, so no field is ever written twice.
    pub fn apply(&mut self, update: StageUpdate) -> Result<()> {
        let pending = self.pending_stage();
        let target = update.stage();

        if target != pending {
            return Err(QaError::InvalidTransition {
                from: pending.to_string(),
                to: target.to_string(),
                reason: format!("{} output is not accepted while {} is pending", target, pending),
            });
        }

        match update {
            StageUpdate::Planned { plan, sub_questions } => {
                if sub_questions.is_empty() {
                    return Err(QaError::InvalidTransition {
                        from: pending.to_string(),
                        to: pending.next().to_string(),
                        reason: "sub_questions must not be empty".to_string(),
                    });
                }
                self.plan = Some(plan);
                self.sub_questions = Some(sub_questions);
            }
            StageUpdate::Retrieved { context } => self.context = Some(context),
            StageUpdate::Drafted { draft_answer } => self.draft_answer = Some(draft_answer),
            StageUpdate::Verified { answer } => self.answer = Some(answer),
        }

        Ok(())
    }

    pub fn require_sub_questions(&self) -> Result<&[String]> {
        self.sub_questions()
            .ok_or_else(|| missing("sub_questions", PipelineStage::Retrieval))
    }

    pub fn require_context(&self, reader: PipelineStage) -> Result<&str> {
        self.context().ok_or_else(|| missing("context", reader))
    }

    pub fn require_draft_answer(&self) -> Result<&str> {
        self.draft_answer()
            .ok_or_else(|| missing("draft_answer", PipelineStage::Verification))
    }

    /// Caller-facing view of a completed state
    pub fn to_response(&self) -> Result<QAResponse> {
        let answer = self
            .answer()
            .ok_or_else(|| missing("answer", PipelineStage::Complete))?;
        let context = self
            .context()
            .ok_or_else(|| missing("context", PipelineStage::Complete))?;

        Ok(QAResponse {
            answer: answer.to_string(),
            context: context.to_string(),
        })
    }
}

fn missing(field: &str, reader: PipelineStage) -> QaError {
    QaError::InvalidTransition {
        from: "incomplete state".to_string(),
        to: reader.to_string(),
        reason: format!("{} has not been written yet", field),
    }
}

/// Answer plus the context it was grounded on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QAResponse {
    pub answer: String,
    pub context: String,
}
