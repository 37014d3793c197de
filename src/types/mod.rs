//! Type definitions module
//!
//! Conversation messages and the per-question pipeline state.

pub mod messages;
pub mod state;

// Re-export commonly used types
pub use messages::{Message, Role, ToolCall};
pub use state::{PipelineStage, QAResponse, QAState, StageUpdate};
