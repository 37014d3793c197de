//! Retrieval capability and passage types
//!
//! The pipeline never talks to a vector index directly. It goes through
//! [`RetrievalCapability`], which the Qdrant adapter implements for
//! production and test fixtures implement for deterministic runs.
//!
//! Components:
//! - Serialization: deterministic context text for model consumption
//! - Embedding: query vectors from Ollama
//! - Qdrant: similarity search over an indexed collection

pub mod embedding;
pub mod qdrant;
pub mod serialization;

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use embedding::OllamaEmbedder;
pub use qdrant::QdrantRetriever;
pub use serialization::{serialize_passages, NO_RELEVANT_CONTEXT};

/// Default number of passages per search
pub const DEFAULT_RETRIEVAL_K: usize = 4;

/// One retrieved unit of document content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text
    pub content: String,

    /// Page reference, rendered as-is ("3", "iv")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,

    /// Source document identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Similarity score reported by the index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Passage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            page: None,
            source: None,
            score: None,
        }
    }

    pub fn with_page(mut self, page: impl ToString) -> Self {
        self.page = Some(page.to_string());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Similarity search over the document corpus
///
/// Implementations must tolerate concurrent calls from several in-flight
/// sub-question tasks.
#[async_trait]
pub trait RetrievalCapability: Send + Sync {
    /// Ranked passages for `query`; `k = None` uses the backend default
    async fn search(&self, query: &str, k: Option<usize>) -> Result<Vec<Passage>>;
}
