//! Application context
//!
//! Built once at process start from [`Settings`]. Holds the shared Ollama
//! and Qdrant backends and the pipeline wired on top of them; every entry
//! point (CLI, HTTP server, diagnostics) takes what it needs from here.

use crate::agent::QaPipeline;
use crate::cli::Settings;
use crate::errors::Result;
use crate::generation::OllamaChatClient;
use crate::retrieval::{OllamaEmbedder, QdrantRetriever};
use crate::telemetry::TelemetryCollector;
use std::sync::Arc;
use tracing::debug;

pub struct AppContext {
    settings: Settings,
    chat: Arc<OllamaChatClient>,
    retriever: Arc<QdrantRetriever>,
    telemetry: TelemetryCollector,
    pipeline: Arc<QaPipeline>,
}

impl AppContext {
    /// Build clients and the pipeline; no network traffic happens here
    pub fn new(settings: Settings) -> Result<Self> {
        let base_url = settings.ollama_url();
        let timeout = settings.request_timeout();

        let chat = Arc::new(OllamaChatClient::with_config(
            &base_url,
            &settings.ollama.chat_model,
            settings.ollama.temperature,
            timeout,
        )?);

        let embedder = OllamaEmbedder::new(&base_url, &settings.ollama.embedding_model, timeout)?;
        let retriever = Arc::new(QdrantRetriever::new(settings.qdrant_settings(), embedder)?);

        let telemetry = TelemetryCollector::new();
        let pipeline = Arc::new(QaPipeline::with_telemetry(
            chat.clone(),
            retriever.clone(),
            telemetry.clone(),
        ));

        debug!(
            "Context ready: ollama={} chat_model={} collection={}",
            base_url, settings.ollama.chat_model, settings.qdrant.collection
        );

        Ok(Self {
            settings,
            chat,
            retriever,
            telemetry,
            pipeline,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn chat_client(&self) -> Arc<OllamaChatClient> {
        Arc::clone(&self.chat)
    }

    pub fn retriever(&self) -> Arc<QdrantRetriever> {
        Arc::clone(&self.retriever)
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// The shared pipeline; every call returns the same instance
    pub fn pipeline(&self) -> Arc<QaPipeline> {
        Arc::clone(&self.pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_from_settings() {
        let mut settings = Settings::default();
        settings.qdrant.collection = "handbooks".to_string();

        let ctx = AppContext::new(settings).unwrap();
        assert_eq!(ctx.chat_client().model(), "qwen2.5:7b-instruct");
        assert_eq!(ctx.chat_client().base_url(), "http://127.0.0.1:11434");
        assert_eq!(ctx.retriever().settings().collection, "handbooks");
        assert_eq!(ctx.retriever().embedder().model(), "nomic-embed-text");
    }

    #[tokio::test]
    async fn test_pipeline_is_built_once() {
        let ctx = AppContext::new(Settings::default()).unwrap();
        assert!(Arc::ptr_eq(&ctx.pipeline(), &ctx.pipeline()));
    }
}
