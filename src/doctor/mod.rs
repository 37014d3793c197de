//! Doctor command for system diagnostics
//!
//! Checks that the backends the pipeline depends on are up and configured:
//! Ollama, both models, Qdrant and the document collection.

use crate::errors::Result;
use crate::generation::OllamaChatClient;
use crate::retrieval::QdrantRetriever;
use colored::Colorize;

/// Health check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Pass,
    Warn(String),
    Fail(String),
}

/// Individual health check
#[derive(Debug)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
}

impl HealthCheck {
    fn new(name: &str, status: HealthStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

/// Doctor diagnostics system
pub struct Doctor<'a> {
    chat: &'a OllamaChatClient,
    retriever: &'a QdrantRetriever,
}

impl<'a> Doctor<'a> {
    pub fn new(chat: &'a OllamaChatClient, retriever: &'a QdrantRetriever) -> Self {
        Self { chat, retriever }
    }

    /// Run all health checks
    pub async fn run_diagnostics(&self) -> Vec<HealthCheck> {
        let mut checks = Vec::new();

        let ollama_up = self.chat.health_check().await.unwrap_or(false);
        checks.push(reachability_check("Ollama API", ollama_up, self.chat.base_url()));

        if ollama_up {
            let models = self.chat.list_models().await;
            checks.push(model_check("Chat Model", &models, self.chat.model()));
            checks.push(model_check(
                "Embedding Model",
                &models,
                self.retriever.embedder().model(),
            ));
        } else {
            let skipped = HealthStatus::Warn("Skipped, Ollama not reachable".to_string());
            checks.push(HealthCheck::new("Chat Model", skipped.clone()));
            checks.push(HealthCheck::new("Embedding Model", skipped));
        }

        let qdrant_up = self.retriever.health_check().await.unwrap_or(false);
        checks.push(reachability_check(
            "Qdrant",
            qdrant_up,
            &self.retriever.settings().url,
        ));

        let collection = &self.retriever.settings().collection;
        if qdrant_up {
            checks.push(collection_check(
                collection,
                self.retriever.collection_exists().await,
            ));
        } else {
            checks.push(HealthCheck::new(
                "Collection",
                HealthStatus::Warn("Skipped, Qdrant not reachable".to_string()),
            ));
        }

        checks
    }

    /// Display diagnostics results
    pub fn display_results(checks: &[HealthCheck]) {
        println!("\n🔍 IKMS System Diagnostics\n");
        println!("{:<20} Status", "Check");
        println!("{}", "=".repeat(50));

        for check in checks {
            let status = match &check.status {
                HealthStatus::Pass => "✅ PASS".green().to_string(),
                HealthStatus::Warn(msg) => format!("⚠️  WARN: {}", msg).yellow().to_string(),
                HealthStatus::Fail(msg) => format!("❌ FAIL: {}", msg).red().to_string(),
            };
            println!("{:<20} {}", check.name, status);
        }

        println!();
    }

    /// Get overall health status
    pub fn overall_status(checks: &[HealthCheck]) -> bool {
        !checks
            .iter()
            .any(|c| matches!(c.status, HealthStatus::Fail(_)))
    }
}

fn reachability_check(name: &str, reachable: bool, url: &str) -> HealthCheck {
    let status = if reachable {
        HealthStatus::Pass
    } else {
        HealthStatus::Fail(format!("Not reachable at {}", url))
    };
    HealthCheck::new(name, status)
}

/// Ollama reports untagged pulls as `<name>:latest`
pub fn model_installed(installed: &[String], wanted: &str) -> bool {
    installed
        .iter()
        .any(|name| name == wanted || (!wanted.contains(':') && *name == format!("{}:latest", wanted)))
}

fn model_check(name: &str, models: &Result<Vec<String>>, wanted: &str) -> HealthCheck {
    let status = match models {
        Ok(models) if model_installed(models, wanted) => HealthStatus::Pass,
        Ok(_) => HealthStatus::Fail(format!(
            "{} not installed. Run: ollama pull {}",
            wanted, wanted
        )),
        Err(e) => HealthStatus::Fail(format!("Cannot list models: {}", e)),
    };
    HealthCheck::new(name, status)
}

fn collection_check(collection: &str, exists: Result<bool>) -> HealthCheck {
    let status = match exists {
        Ok(true) => HealthStatus::Pass,
        Ok(false) => HealthStatus::Fail(format!(
            "Collection '{}' does not exist; index documents first",
            collection
        )),
        Err(e) => HealthStatus::Fail(format!("Cannot check collection: {}", e)),
    };
    HealthCheck::new("Collection", status)
}
