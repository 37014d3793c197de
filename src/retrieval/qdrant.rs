//! Qdrant-backed similarity search over an indexed document collection

use async_trait::async_trait;
use qdrant_client::qdrant::{value::Kind, SearchPointsBuilder, Value as QdrantValue};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::{QaError, Result};
use crate::retrieval::embedding::OllamaEmbedder;
use crate::retrieval::{Passage, RetrievalCapability, DEFAULT_RETRIEVAL_K};

/// Payload key holding chunk text when the collection was written by LangChain
pub const DEFAULT_CONTENT_KEY: &str = "page_content";

/// Keys tried after the configured content key
const FALLBACK_CONTENT_KEYS: [&str; 2] = ["text", "document"];

/// Nested metadata object written by LangChain vector stores
const METADATA_KEY: &str = "metadata";

/// Qdrant collection settings
#[derive(Debug, Clone)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub content_key: String,
    pub score_threshold: Option<f32>,
    pub default_k: usize,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            api_key: None,
            collection: "documents".to_string(),
            content_key: DEFAULT_CONTENT_KEY.to_string(),
            score_threshold: None,
            default_k: DEFAULT_RETRIEVAL_K,
        }
    }
}

/// Retrieval backend: embed the query with Ollama, search Qdrant
pub struct QdrantRetriever {
    client: Qdrant,
    embedder: OllamaEmbedder,
    settings: QdrantSettings,
}

impl QdrantRetriever {
    /// Build the client; no network traffic happens until the first search
    pub fn new(settings: QdrantSettings, embedder: OllamaEmbedder) -> Result<Self> {
        let client = Qdrant::from_url(&settings.url)
            .api_key(settings.api_key.clone())
            .build()
            .map_err(|e| QaError::RetrievalError(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self {
            client,
            embedder,
            settings,
        })
    }

    /// Check that the Qdrant server answers
    pub async fn health_check(&self) -> Result<bool> {
        match self.client.health_check().await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!("Qdrant health check failed: {}", e);
                Ok(false)
            }
        }
    }

    /// Check that the configured collection exists
    pub async fn collection_exists(&self) -> Result<bool> {
        self.client
            .collection_exists(self.settings.collection.as_str())
            .await
            .map_err(|e| QaError::RetrievalError(format!("Failed to query collections: {}", e)))
    }

    pub fn settings(&self) -> &QdrantSettings {
        &self.settings
    }

    pub fn embedder(&self) -> &OllamaEmbedder {
        &self.embedder
    }
}

#[async_trait]
impl RetrievalCapability for QdrantRetriever {
    async fn search(&self, query: &str, k: Option<usize>) -> Result<Vec<Passage>> {
        let limit = k.unwrap_or(self.settings.default_k);
        let vector = self.embedder.embed(query).await?;

        let mut request =
            SearchPointsBuilder::new(self.settings.collection.as_str(), vector, limit as u64)
                .with_payload(true);
        if let Some(threshold) = self.settings.score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| QaError::RetrievalError(format!("Failed to search points: {}", e)))?;

        let passages: Vec<Passage> = response
            .result
            .into_iter()
            .filter_map(|point| {
                passage_from_payload(&point.payload, &self.settings.content_key)
                    .map(|p| p.with_score(point.score))
            })
            .collect();

        debug!(
            "Qdrant returned {} passages for '{}' (k={})",
            passages.len(),
            query,
            limit
        );

        Ok(passages)
    }
}

/// Map a point payload to a passage; points without text are dropped
fn passage_from_payload(
    payload: &HashMap<String, QdrantValue>,
    content_key: &str,
) -> Option<Passage> {
    let content = std::iter::once(content_key)
        .chain(FALLBACK_CONTENT_KEYS)
        .find_map(|key| payload.get(key).and_then(qdrant_value_to_string))?;

    let mut passage = Passage::new(content);
    passage.page = metadata_field(payload, "page");
    passage.source = metadata_field(payload, "source");
    Some(passage)
}

/// Look up `key` at the top level, then inside the nested metadata object
fn metadata_field(payload: &HashMap<String, QdrantValue>, key: &str) -> Option<String> {
    if let Some(value) = payload.get(key).and_then(qdrant_value_to_display) {
        return Some(value);
    }

    let nested = payload.get(METADATA_KEY)?.kind.as_ref()?;
    match nested {
        Kind::StructValue(fields) => fields.fields.get(key).and_then(qdrant_value_to_display),
        _ => None,
    }
}

fn qdrant_value_to_string(value: &QdrantValue) -> Option<String> {
    match value.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

/// Render scalar payload values; integral doubles print without a fraction
fn qdrant_value_to_display(value: &QdrantValue) -> Option<String> {
    match value.kind.as_ref()? {
        Kind::StringValue(s) => Some(s.clone()),
        Kind::IntegerValue(i) => Some(i.to_string()),
        Kind::DoubleValue(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Kind::DoubleValue(f) => Some(f.to_string()),
        Kind::BoolValue(b) => Some(b.to_string()),
        _ => None,
    }
}
