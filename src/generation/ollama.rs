//! Ollama chat client
//!
//! Non-streaming completions with tool calling:
//! - Endpoint: POST /api/chat (`stream: false`)
//! - Tools advertised in function format
//! - Tool call arguments may arrive as an object or a JSON-encoded string

use crate::errors::{QaError, Result};
use crate::generation::GenerationCapability;
use crate::tools::ToolSchema;
use crate::types::{Message, Role, ToolCall};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default sampling temperature; answers should be reproducible
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Ollama chat client
#[derive(Debug, Clone)]
pub struct OllamaChatClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaChatClient {
    /// Create client with custom configuration
    pub fn with_config(
        base_url: &str,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(QaError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!("Ollama health check failed: {}", e);
                Ok(false)
            }
        }
    }

    /// List installed models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QaError::GenerationError(format!("Failed to list models: {}", e)))?;

        if !response.status().is_success() {
            return Err(QaError::GenerationError(format!(
                "Failed to retrieve model list: HTTP {}",
                response.status()
            )));
        }

        let models_response: ModelsResponse = response
            .json()
            .await
            .map_err(|e| QaError::GenerationError(format!("Failed to parse models: {}", e)))?;

        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    fn build_request<'a>(&'a self, messages: &[Message], tools: &[ToolSchema]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: messages.iter().map(WireMessage::from).collect(),
            stream: false,
            tools: tools.iter().map(WireTool::from).collect(),
            options: ChatOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl GenerationCapability for OllamaChatClient {
    async fn generate(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message> {
        let url = format!("{}/api/chat", self.base_url);
        let request = self.build_request(messages, tools);

        trace!(
            "POST {} ({} messages, {} tools)",
            url,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| QaError::GenerationError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(QaError::GenerationError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| QaError::GenerationError(format!("Failed to parse chat response: {}", e)))?;

        let message = body.message.into_message()?;
        debug!(
            "{} replied with {} chars and {} tool calls",
            self.model,
            message.content.len(),
            message.tool_calls.len()
        );
        Ok(message)
    }
}

/// Ollama chat request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

/// Message as Ollama encodes it
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
        }
    }
}

impl WireMessage {
    fn into_message(self) -> Result<Message> {
        let tool_calls = self
            .tool_calls
            .into_iter()
            .map(|call| {
                let arguments = decode_arguments(call.function.arguments)?;
                Ok(ToolCall::new(call.function.name, arguments))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Message {
            role: self.role,
            content: self.content,
            tool_calls,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// Tool advertisement in function format
#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ToolSchema,
}

impl From<&ToolSchema> for WireTool {
    fn from(schema: &ToolSchema) -> Self {
        Self {
            kind: "function",
            function: schema.clone(),
        }
    }
}

/// Some models emit arguments as a JSON string rather than an object
fn decode_arguments(arguments: serde_json::Value) -> Result<serde_json::Value> {
    match arguments {
        serde_json::Value::String(raw) if raw.trim().is_empty() => {
            Ok(serde_json::Value::Object(Default::default()))
        }
        serde_json::Value::String(raw) => Ok(serde_json::from_str(&raw)?),
        serde_json::Value::Null => Ok(serde_json::Value::Object(Default::default())),
        other => Ok(other),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: WireMessage,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}
