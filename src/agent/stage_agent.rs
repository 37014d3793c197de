//! Stage agent: a generation backend bound to one system instruction
//!
//! Every invocation sends `[system] + input` to the backend and returns the
//! whole conversation with the generated reply appended.

use crate::errors::Result;
use crate::generation::GenerationCapability;
use crate::tools::ToolSchema;
use crate::types::{Message, Role};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tracing::trace;

/// What a stage hands to its agent
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInput {
    /// Bare question, sent as a single user message
    Question(String),

    /// Pre-built messages appended after the system instruction
    Messages(Vec<Message>),
}

impl From<&str> for AgentInput {
    fn from(question: &str) -> Self {
        AgentInput::Question(question.to_string())
    }
}

impl From<String> for AgentInput {
    fn from(question: String) -> Self {
        AgentInput::Question(question)
    }
}

impl From<Vec<Message>> for AgentInput {
    fn from(messages: Vec<Message>) -> Self {
        AgentInput::Messages(messages)
    }
}

/// Conversation after one agent invocation
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    pub messages: Vec<Message>,
}

impl AgentOutput {
    /// The generated reply
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the most recent assistant message, or `""`
    pub fn last_assistant_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Generation backend plus fixed instruction and tool set
#[derive(Clone)]
pub struct StageAgent {
    generator: Arc<dyn GenerationCapability>,
    system_prompt: String,
    tools: Vec<ToolSchema>,
}

impl StageAgent {
    pub fn new(generator: Arc<dyn GenerationCapability>, system_prompt: impl Into<String>) -> Self {
        Self {
            generator,
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
        }
    }

    /// Bind tools the backend may call
    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = tools;
        self
    }

    fn build_messages(&self, input: AgentInput) -> Vec<Message> {
        let mut messages = vec![Message::system(self.system_prompt.clone())];
        match input {
            AgentInput::Question(question) => messages.push(Message::user(question)),
            AgentInput::Messages(extra) => messages.extend(extra),
        }
        messages
    }

    /// Invoke the backend once and wait for the reply
    pub async fn invoke(&self, input: impl Into<AgentInput>) -> Result<AgentOutput> {
        let mut messages = self.build_messages(input.into());
        trace!(
            "Invoking stage agent with {} messages and {} tools",
            messages.len(),
            self.tools.len()
        );

        let reply = self.generator.generate(&messages, &self.tools).await?;
        messages.push(reply);
        Ok(AgentOutput { messages })
    }

    /// Detached invocation that owns everything it needs
    ///
    /// The returned future borrows nothing from `self`, so callers can
    /// collect several and join them.
    pub fn invoke_async(&self, input: impl Into<AgentInput>) -> BoxFuture<'static, Result<AgentOutput>> {
        let agent = self.clone();
        let input = input.into();
        Box::pin(async move { agent.invoke(input).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::QaError;
    use crate::tools::RetrievalTool;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Echoes the last user message and records what it saw
    struct EchoGenerator {
        seen: Mutex<Vec<(Vec<Message>, usize)>>,
    }

    impl EchoGenerator {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl GenerationCapability for EchoGenerator {
        async fn generate(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message> {
            self.seen
                .lock()
                .unwrap()
                .push((messages.to_vec(), tools.len()));
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(Message::assistant(format!("echo: {}", last)))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl GenerationCapability for FailingGenerator {
        async fn generate(&self, _messages: &[Message], _tools: &[ToolSchema]) -> Result<Message> {
            Err(QaError::GenerationError("model unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_question_input_prepends_system() {
        let generator = Arc::new(EchoGenerator::new());
        let agent = StageAgent::new(generator.clone(), "be brief");

        let output = agent.invoke("What is Qdrant?").await.unwrap();
        assert_eq!(output.messages.len(), 3);
        assert_eq!(output.messages[0], Message::system("be brief"));
        assert_eq!(output.messages[1], Message::user("What is Qdrant?"));
        assert_eq!(output.last_assistant_content(), "echo: What is Qdrant?");
    }

    #[tokio::test]
    async fn test_message_input_and_tools() {
        let generator = Arc::new(EchoGenerator::new());
        let agent = StageAgent::new(generator.clone(), "retrieve")
            .with_tools(vec![RetrievalTool::schema()]);

        let input = vec![Message::user("Retrieve context for: a")];
        agent.invoke(input).await.unwrap();

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].0[0].role, Role::System);
        assert_eq!(seen[0].0[1].content, "Retrieve context for: a");
        assert_eq!(seen[0].1, 1);
    }

    #[tokio::test]
    async fn test_invoke_async_is_detached() {
        let generator = Arc::new(EchoGenerator::new());
        let futures = {
            let agent = StageAgent::new(generator, "sys");
            vec![agent.invoke_async("one"), agent.invoke_async("two")]
        };

        let outputs = futures_util::future::try_join_all(futures).await.unwrap();
        assert_eq!(outputs[0].last_assistant_content(), "echo: one");
        assert_eq!(outputs[1].last_assistant_content(), "echo: two");
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let agent = StageAgent::new(Arc::new(FailingGenerator), "sys");
        assert!(matches!(
            agent.invoke("q").await,
            Err(QaError::GenerationError(_))
        ));
    }

    #[test]
    fn test_last_assistant_content_fallback() {
        let output = AgentOutput {
            messages: vec![Message::system("s"), Message::user("u")],
        };
        assert_eq!(output.last_assistant_content(), "");

        let output = AgentOutput {
            messages: vec![
                Message::assistant("first"),
                Message::assistant("second"),
                Message::tool("tool result"),
            ],
        };
        assert_eq!(output.last_assistant_content(), "second");
    }
}
