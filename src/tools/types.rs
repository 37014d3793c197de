//! Tool schema and output types
//!
//! A tool is advertised to the generation backend as a [`ToolSchema`] and
//! answers with a [`ToolOutput`] carrying two channels: text for the model
//! and the raw artifact for callers that want structured data.

use crate::retrieval::Passage;
use serde::{Deserialize, Serialize};

/// Tool schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,

    /// Tool description shown to the model
    pub description: String,

    /// Parameter schema (JSON Schema)
    pub parameters: serde_json::Value,
}

impl ToolSchema {
    /// Create new tool schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Result of one tool invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text handed back to the model
    pub content: String,

    /// Passages behind the text
    pub artifact: Vec<Passage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_schema_creation() {
        let schema = ToolSchema::new(
            "test_tool",
            "A test tool",
            serde_json::json!({"type": "object"}),
        );

        assert_eq!(schema.name, "test_tool");
        assert_eq!(schema.description, "A test tool");
        assert_eq!(schema.parameters["type"], "object");
    }
}
