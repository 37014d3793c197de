//! Retrieval tool exposed to the retrieval stage agent
//!
//! Wraps a [`RetrievalCapability`] so the model can request searches. The
//! content channel is the serialized passage text; the artifact channel
//! keeps the passages themselves.

use crate::errors::Result;
use crate::retrieval::{serialize_passages, RetrievalCapability};
use crate::tools::types::{ToolOutput, ToolSchema};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Name the model must use to invoke retrieval
pub const RETRIEVAL_TOOL_NAME: &str = "retrieval_tool";

/// Parsed retrieval tool arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalArgs {
    pub query: String,
    pub k: Option<usize>,
}

impl RetrievalArgs {
    /// Parse model-supplied arguments
    ///
    /// Returns `None` when `query` is missing, not a string, or blank.
    /// `k` is accepted as a number or a numeric string; anything else falls
    /// back to the backend default.
    pub fn parse(args: &serde_json::Value) -> Option<Self> {
        let query = args.get("query")?.as_str()?.trim();
        if query.is_empty() {
            return None;
        }

        let k = args.get("k").and_then(|v| match v {
            serde_json::Value::Number(n) => n.as_u64().map(|n| n as usize),
            serde_json::Value::String(s) => s.trim().parse::<usize>().ok(),
            _ => None,
        });

        Some(Self {
            query: query.to_string(),
            k: k.filter(|k| *k > 0),
        })
    }
}

/// Retrieval tool bound to a backend
#[derive(Clone)]
pub struct RetrievalTool {
    backend: Arc<dyn RetrievalCapability>,
}

impl RetrievalTool {
    pub fn new(backend: Arc<dyn RetrievalCapability>) -> Self {
        Self { backend }
    }

    /// Schema advertised to the generation backend
    pub fn schema() -> ToolSchema {
        ToolSchema::new(
            RETRIEVAL_TOOL_NAME,
            "Search the indexed documents and return the most relevant chunks \
             with their page references",
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query for the document index"
                    },
                    "k": {
                        "type": "integer",
                        "description": "Number of chunks to return (optional)",
                        "minimum": 1
                    }
                },
                "required": ["query"]
            }),
        )
    }

    /// Run one search; backend failures propagate
    pub async fn invoke(&self, args: &RetrievalArgs) -> Result<ToolOutput> {
        let passages = self.backend.search(&args.query, args.k).await?;
        debug!(
            "{} returned {} passages for '{}'",
            RETRIEVAL_TOOL_NAME,
            passages.len(),
            args.query
        );

        Ok(ToolOutput {
            content: serialize_passages(&passages),
            artifact: passages,
        })
    }
}
