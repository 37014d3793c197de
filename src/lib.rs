//! IKMS v0.3 - Grounded question answering over indexed documents
//!
//! Answers a question in four stages over one shared state:
//!
//! - **Planning**: split the question into focused sub-questions
//! - **Retrieval**: search the vector index for every sub-question in parallel
//! - **Summarization**: draft an answer from the retrieved context only
//! - **Verification**: strip claims the context does not support
//!
//! Backends are reached through [`generation::GenerationCapability`] and
//! [`retrieval::RetrievalCapability`]; Ollama and Qdrant implement them in
//! production.

pub mod agent;
pub mod errors;
pub mod generation;
pub mod retrieval;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use agent::QaPipeline;
pub use errors::{QaError, Result};
pub use types::{QAResponse, QAState};

// Entry points and operations
pub mod app;
pub mod cli;
pub mod doctor;
pub mod server;
pub mod telemetry;
