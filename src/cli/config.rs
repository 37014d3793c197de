//! Configuration management for IKMS
//!
//! Provides TOML-based settings with defaults, environment overrides and
//! validation.
//! Location: ~/.ikms/config.toml

use crate::errors::{QaError, Result};
use crate::retrieval::qdrant::{QdrantSettings, DEFAULT_CONTENT_KEY};
use crate::retrieval::DEFAULT_RETRIEVAL_K;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration for IKMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub ollama: OllamaSettings,
    pub qdrant: QdrantSection,
    pub retrieval: RetrievalSettings,
    pub server: ServerSettings,
}

/// Ollama connection and model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub host: String,
    pub port: u16,
    /// Full base URL; takes precedence over host and port when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

/// Vector index configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantSection {
    pub url: String,
    pub collection: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub content_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Passages per search when the model does not ask for a count
    pub k: usize,
}

/// HTTP ingress configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
            url: None,
            chat_model: crate::generation::DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: crate::retrieval::embedding::DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: crate::generation::ollama::DEFAULT_TEMPERATURE,
            request_timeout_secs: 120,
        }
    }
}

impl Default for QdrantSection {
    fn default() -> Self {
        let defaults = QdrantSettings::default();
        Self {
            url: defaults.url,
            collection: defaults.collection,
            api_key: None,
            content_key: DEFAULT_CONTENT_KEY.to_string(),
            score_threshold: None,
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: DEFAULT_RETRIEVAL_K,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Environment variables that override file settings
pub const ENV_OLLAMA_URL: &str = "IKMS_OLLAMA_URL";
pub const ENV_CHAT_MODEL: &str = "IKMS_CHAT_MODEL";
pub const ENV_EMBEDDING_MODEL: &str = "IKMS_EMBEDDING_MODEL";
pub const ENV_QDRANT_URL: &str = "IKMS_QDRANT_URL";
pub const ENV_QDRANT_API_KEY: &str = "IKMS_QDRANT_API_KEY";
pub const ENV_COLLECTION: &str = "IKMS_COLLECTION";
pub const ENV_RETRIEVAL_K: &str = "IKMS_RETRIEVAL_K";

impl Settings {
    /// Load settings: explicit file, else the default location, else
    /// built-in defaults; then environment overrides and validation
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default()?,
        };

        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse a config file; missing keys take their defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            QaError::ConfigError(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents)
            .map_err(|e| QaError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Settings from ~/.ikms/config.toml when present
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Settings::default()),
        }
    }

    /// Standard config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ikms").join("config.toml"))
    }

    /// Apply overrides from a key lookup (the process environment in practice)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_OLLAMA_URL) {
            self.ollama.url = Some(url);
        }
        if let Some(model) = get(ENV_CHAT_MODEL) {
            self.ollama.chat_model = model;
        }
        if let Some(model) = get(ENV_EMBEDDING_MODEL) {
            self.ollama.embedding_model = model;
        }
        if let Some(url) = get(ENV_QDRANT_URL) {
            self.qdrant.url = url;
        }
        if let Some(key) = get(ENV_QDRANT_API_KEY) {
            self.qdrant.api_key = Some(key);
        }
        if let Some(collection) = get(ENV_COLLECTION) {
            self.qdrant.collection = collection;
        }
        if let Some(k) = get(ENV_RETRIEVAL_K) {
            self.retrieval.k = k.trim().parse().map_err(|_| {
                QaError::ConfigError(format!("{} must be a positive integer, got '{}'", ENV_RETRIEVAL_K, k))
            })?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.k == 0 {
            return Err(QaError::ConfigError(
                "retrieval.k must be greater than 0".to_string(),
            ));
        }

        if self.ollama.port == 0 || self.server.port == 0 {
            return Err(QaError::ConfigError(
                "ports must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.ollama.temperature) {
            return Err(QaError::ConfigError(
                "ollama.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.ollama.request_timeout_secs == 0 {
            return Err(QaError::ConfigError(
                "ollama.request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("ollama.chat_model", &self.ollama.chat_model),
            ("ollama.embedding_model", &self.ollama.embedding_model),
            ("qdrant.collection", &self.qdrant.collection),
            ("qdrant.url", &self.qdrant.url),
        ] {
            if value.trim().is_empty() {
                return Err(QaError::ConfigError(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| QaError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Get Ollama base URL
    pub fn ollama_url(&self) -> String {
        match &self.ollama.url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.ollama.host, self.ollama.port),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama.request_timeout_secs)
    }

    /// Settings handed to the Qdrant retriever
    pub fn qdrant_settings(&self) -> QdrantSettings {
        QdrantSettings {
            url: self.qdrant.url.clone(),
            api_key: self.qdrant.api_key.clone(),
            collection: self.qdrant.collection.clone(),
            content_key: self.qdrant.content_key.clone(),
            score_threshold: self.qdrant.score_threshold,
            default_k: self.retrieval.k,
        }
    }

    /// Apply `serve --host/--port` flags over the configured bind address
    pub fn override_server(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
    }

    /// Address the HTTP server binds to
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
