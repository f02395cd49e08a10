//! Configuration management for rag-consultant
//!
//! Settings are resolved once at startup: built-in defaults, then an optional
//! TOML file, then environment overrides. The resulting [`Config`] is passed
//! explicitly to every component; library code never reads the environment.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key for the embedding and chat providers
    #[serde(default, skip_serializing)]
    pub api_key: String,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout applied to every provider call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chat model configuration
    #[serde(default)]
    pub chat: ChatConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Knowledge base and index locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Document loader configuration
    #[serde(default)]
    pub loader: LoaderConfig,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Texts per embedding request
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

/// Chat completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    pub size: usize,

    /// Overlap characters between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of chunks retrieved per question
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Drop retrieved chunks scoring below this cosine similarity
    #[serde(default)]
    pub min_score: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the source documents
    #[serde(default = "default_knowledge_base_path")]
    pub knowledge_base: String,

    /// Directory holding the persisted index
    #[serde(default = "default_vector_store_path")]
    pub vector_store: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// File extensions (without the dot) treated as plain text
    #[serde(default = "default_loader_extensions")]
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            embedding: EmbeddingConfig::default(),
            chat: ChatConfig::default(),
            chunk: ChunkConfig::default(),
            query: QueryConfig::default(),
            paths: PathsConfig::default(),
            loader: LoaderConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            batch_size: default_embedding_batch_size(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: None,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            knowledge_base: default_knowledge_base_path(),
            vector_store: default_vector_store_path(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions: default_loader_extensions(),
        }
    }
}

impl Config {
    /// Resolve the process configuration: defaults, optional TOML file,
    /// then environment overrides. Variables from `env_file` apply only where
    /// the process environment does not set them. The result is validated.
    pub fn resolve(config_path: Option<&Path>, env_file: Option<&Path>) -> Result<Self> {
        let file_vars = match env_file {
            Some(path) => read_env_file(path)?,
            None => HashMap::new(),
        };
        Self::resolve_with(config_path, |key| {
            std::env::var(key)
                .ok()
                .or_else(|| file_vars.get(key).cloned())
        })
    }

    /// [`Config::resolve`] with an explicit variable lookup
    pub fn resolve_with<F>(config_path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match config_path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env_with(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file (without env overrides or validation)
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = get("EMBEDDING_BATCH_SIZE") {
            self.embedding.batch_size = parse_env("EMBEDDING_BATCH_SIZE", &v)?;
        }
        if let Some(v) = get("LLM_MODEL") {
            self.chat.model = v;
        }
        if let Some(v) = get("CHUNK_SIZE") {
            self.chunk.size = parse_env("CHUNK_SIZE", &v)?;
        }
        if let Some(v) = get("CHUNK_OVERLAP") {
            self.chunk.overlap = parse_env("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = get("TOP_K_RESULTS") {
            self.query.top_k = parse_env("TOP_K_RESULTS", &v)?;
        }
        if let Some(v) = get("MIN_SCORE") {
            self.query.min_score = Some(parse_env("MIN_SCORE", &v)?);
        }
        if let Some(v) = get("KNOWLEDGE_BASE_PATH") {
            self.paths.knowledge_base = v;
        }
        if let Some(v) = get("VECTOR_STORE_PATH") {
            self.paths.vector_store = v;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config(
                "API key is required. Set the OPENAI_API_KEY environment variable".to_string(),
            ));
        }

        if self.chunk.size == 0 {
            return Err(Error::Config("chunk.size must be > 0".to_string()));
        }

        if self.chunk.overlap >= self.chunk.size {
            return Err(Error::Config(
                "chunk.overlap must be < chunk.size".to_string(),
            ));
        }

        if self.query.top_k == 0 {
            return Err(Error::Config("query.top_k must be >= 1".to_string()));
        }

        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be >= 1".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be >= 1".to_string(),
            ));
        }

        if let Some(min) = self.query.min_score {
            if !(-1.0..=1.0).contains(&min) {
                return Err(Error::Config(
                    "query.min_score must be between -1.0 and 1.0".to_string(),
                ));
            }
        }

        if self.loader.extensions.is_empty() {
            return Err(Error::Config(
                "loader.extensions must list at least one extension".to_string(),
            ));
        }

        Ok(())
    }

    /// Timeout applied around each provider call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn knowledge_base_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.knowledge_base)
    }

    pub fn vector_store_path(&self) -> PathBuf {
        PathBuf::from(&self.paths.vector_store)
    }
}

/// Read `KEY=value` pairs from a dotenv file. A missing file yields no variables.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }

    debug!("Reading environment file {}", path.display());
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) =
            item.map_err(|e| Error::Config(format!("Invalid {}: {}", path.display(), e)))?;
        vars.insert(key, value);
    }
    Ok(vars)
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.embedding.model, "text-embedding-ada-002");
        assert_eq!(config.chat.model, "gpt-3.5-turbo");
        assert_eq!(config.chunk.size, 1000);
        assert_eq!(config.chunk.overlap, 200);
        assert_eq!(config.query.top_k, 4);
        assert_eq!(config.paths.knowledge_base, "./data/knowledge_base");
        assert_eq!(config.paths.vector_store, "./data/vector_store");
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("LLM_MODEL", "gpt-4o-mini"),
            ("CHUNK_SIZE", "500"),
            ("CHUNK_OVERLAP", "50"),
            ("TOP_K_RESULTS", "2"),
            ("VECTOR_STORE_PATH", "/tmp/store"),
        ]);
        let mut config = Config::default();
        config.apply_env_with(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.chat.model, "gpt-4o-mini");
        assert_eq!(config.chunk.size, 500);
        assert_eq!(config.chunk.overlap, 50);
        assert_eq!(config.query.top_k, 2);
        assert_eq!(config.paths.vector_store, "/tmp/store");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_rejects_bad_numbers() {
        let vars = env(&[("CHUNK_SIZE", "lots")]);
        let mut config = Config::default();
        let err = config.apply_env_with(|k| vars.get(k).cloned()).unwrap_err();
        assert!(err.to_string().contains("CHUNK_SIZE"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config {
            api_key: "sk-test".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());

        // Invalid: overlap >= size
        config.chunk.overlap = config.chunk.size;
        assert!(config.validate().is_err());
        config.chunk.overlap = 100;

        config.query.top_k = 0;
        assert!(config.validate().is_err());
        config.query.top_k = 4;

        config.query.min_score = Some(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_toml_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("consultant.toml");
        std::fs::write(
            &path,
            "[chunk]\nsize = 400\noverlap = 40\n\n[query]\ntop_k = 6\nmin_score = 0.5\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.chunk.size, 400);
        assert_eq!(config.chunk.overlap, 40);
        assert_eq!(config.query.top_k, 6);
        assert_eq!(config.query.min_score, Some(0.5));
        // Untouched sections keep their defaults
        assert_eq!(config.embedding.model, default_embedding_model());
    }

    #[test]
    fn test_env_file_fills_unset_variables() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(
            &path,
            "# local settings\nOPENAI_API_KEY=sk-from-file\nLLM_MODEL=gpt-4o\nTOP_K_RESULTS=7\n",
        )
        .unwrap();

        let file_vars = read_env_file(&path).unwrap();
        assert_eq!(file_vars.len(), 3);

        let process = env(&[("LLM_MODEL", "gpt-4o-mini")]);
        let config = Config::resolve_with(None, |k| {
            process.get(k).cloned().or_else(|| file_vars.get(k).cloned())
        })
        .unwrap();

        assert_eq!(config.api_key, "sk-from-file");
        assert_eq!(config.chat.model, "gpt-4o-mini");
        assert_eq!(config.query.top_k, 7);
    }

    #[test]
    fn test_missing_env_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_env_file(&tmp.path().join(".env")).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = Config::load(&tmp.path().join("nope.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
