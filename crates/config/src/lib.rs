//! Operational knobs (§6) for the document QA engine.
//!
//! Loaded in layers: built-in defaults, then an optional YAML file, then
//! environment variables (prefixed `DOCQA_`) on top.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Retrieval tuning (§4.9, §5 resource bounds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub max_refs: usize,
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { max_refs: 3, min_score: 0.15 }
    }
}

/// Retrieval cache tuning (§4.12).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub cache_size: usize,
    pub cache_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { cache_size: 100, cache_ttl_seconds: 600 }
    }
}

/// External-collaborator tuning (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    pub embedding_dim: usize,
    pub llm_timeout_ms: u64,
    pub embed_timeout_ms: u64,
    pub classify_timeout_ms: u64,
    pub summary_timeout_ms: u64,
    pub embedding_endpoint: Option<String>,
    pub llm_endpoint: Option<String>,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 1024,
            llm_timeout_ms: 15_000,
            embed_timeout_ms: 10_000,
            classify_timeout_ms: 5_000,
            summary_timeout_ms: 10_000,
            embedding_endpoint: None,
            llm_endpoint: None,
        }
    }
}

/// Conversation memory bound (§4.14, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    pub memory_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self { memory_turns: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Path to the persisted JSON artifact (§6). `None` disables persistence
    /// (process-lifetime in-memory only).
    pub path: Option<String>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { path: None }
    }
}

/// HTTP server tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8080, log_level: "info".to_string() }
    }
}

/// Top-level engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub external: ExternalConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Settings {
    /// Load defaults, then an optional file, then `DOCQA_`-prefixed env vars.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        builder = builder.add_source(Environment::with_prefix("DOCQA").separator("__"));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_knobs() {
        let settings = Settings::default();
        assert_eq!(settings.retrieval.max_refs, 3);
        assert_eq!(settings.retrieval.min_score, 0.15);
        assert_eq!(settings.cache.cache_size, 100);
        assert_eq!(settings.cache.cache_ttl_seconds, 600);
        assert_eq!(settings.external.embedding_dim, 1024);
        assert_eq!(settings.external.llm_timeout_ms, 15_000);
        assert_eq!(settings.conversation.memory_turns, 10);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.retrieval.max_refs, 3);
    }
}
