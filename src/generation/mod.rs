//! Language-model generation capability
//!
//! Stage agents depend on [`GenerationCapability`] only. The Ollama chat
//! client is the production implementation; tests script their own.

pub mod ollama;

use crate::errors::Result;
use crate::tools::ToolSchema;
use crate::types::Message;
use async_trait::async_trait;

pub use ollama::{OllamaChatClient, DEFAULT_CHAT_MODEL, DEFAULT_OLLAMA_URL};

/// Produce the next assistant message for a conversation
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Generate one assistant message
    ///
    /// When `tools` is non-empty the reply may carry tool calls instead of
    /// (or alongside) text content.
    async fn generate(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message>;
}
