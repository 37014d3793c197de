//! Tools offered to stage agents
//!
//! The retrieval stage is the only tool user: it lets the model issue
//! similarity searches through the retrieval tool.

pub mod retrieval_tool;
pub mod types;

// Re-export commonly used types
pub use retrieval_tool::{RetrievalArgs, RetrievalTool, RETRIEVAL_TOOL_NAME};
pub use types::{ToolOutput, ToolSchema};
