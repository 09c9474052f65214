use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    512
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Embedding settings shared by ingestion and query time.
///
/// Both paths read this one section, so the model that embedded a chunk is
/// always the model that embeds the query against it. Changing `model` or
/// `dims` requires re-ingesting.
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embed_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            base_url: default_openai_base_url(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_embed_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub provider: String,
    #[serde(default)]
    pub pinecone: Option<PineconeConfig>,
    #[serde(default)]
    pub qdrant: Option<QdrantConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PineconeConfig {
    /// Data-plane host of the index, e.g. `https://my-index-abc123.svc.us-east-1.pinecone.io`.
    pub index_host: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QdrantConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,
    pub collection: String,
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_ingest_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: default_ingest_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_ingest_root() -> PathBuf {
    PathBuf::from("./docs")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("failed to read config file {}: {}", path.display(), e))
    })?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| Error::config(format!("failed to parse config file: {}", e)))?;

    // Validate chunking
    if config.chunking.chunk_size == 0 {
        return Err(Error::config("chunking.chunk_size must be > 0"));
    }
    if config.chunking.overlap >= config.chunking.chunk_size {
        return Err(Error::config(format!(
            "chunking.overlap ({}) must be less than chunking.chunk_size ({})",
            config.chunking.overlap, config.chunking.chunk_size
        )));
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        return Err(Error::config("retrieval.top_k must be >= 1"));
    }

    // Validate store
    match config.store.provider.as_str() {
        "pinecone" => {
            if config.store.pinecone.is_none() {
                return Err(Error::config(
                    "[store.pinecone] section required when store.provider is 'pinecone'",
                ));
            }
        }
        "qdrant" => {
            if config.store.qdrant.is_none() {
                return Err(Error::config(
                    "[store.qdrant] section required when store.provider is 'qdrant'",
                ));
            }
        }
        "memory" => {}
        other => {
            return Err(Error::config(format!(
                "Unknown store provider: '{}'. Must be pinecone, qdrant, or memory.",
                other
            )));
        }
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            return Err(Error::config(format!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            )));
        }
        if config.embedding.model.is_none() {
            return Err(Error::config(format!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            )));
        }
        if config.embedding.batch_size == 0 {
            return Err(Error::config("embedding.batch_size must be >= 1"));
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => {
            return Err(Error::config(format!(
                "Unknown embedding provider: '{}'. Must be disabled or openai.",
                other
            )));
        }
    }

    Ok(config)
}
