use crate::embedding::{EmbeddingProvider, HttpEmbedding, LocalEmbedding};
use crate::qdrant::QdrantStore;
use crate::store::{InMemoryVectorStore, VectorStore};
use cinedex_core::CinedexResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Which embedding service to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Google Gemini `embedContent` API.
    Gemini,
    /// Any OpenAI-compatible `/v1/embeddings` endpoint.
    OpenAi,
    /// In-process hashing embedder; no network, no credentials.
    Local,
}

/// Embedding provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Which service computes embeddings.
    #[serde(default = "default_embedding_backend")]
    pub provider: EmbeddingBackend,
    /// Provider-side model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Falls back to `CINEDEX_EMBEDDING_API_KEY` when empty.
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's public endpoint.
    pub base_url: Option<String>,
    /// Vector dimensionality; every collection is created with this size.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Gemini
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_dimension() -> usize {
    768
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_backend(),
            model: default_embedding_model(),
            api_key: String::new(),
            base_url: None,
            dimension: default_dimension(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    /// Endpoint root, honouring an explicit override.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                EmbeddingBackend::Gemini => "https://generativelanguage.googleapis.com",
                EmbeddingBackend::OpenAi => "https://api.openai.com",
                EmbeddingBackend::Local => "local://hashing",
            }
        }
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which vector store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackendKind {
    /// Qdrant over its REST API.
    Qdrant,
    /// Process-local store; contents are lost on exit.
    Memory,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Store implementation.
    #[serde(default = "default_vector_backend")]
    pub backend: VectorBackendKind,
    /// Qdrant REST endpoint.
    #[serde(default = "default_vector_url")]
    pub url: String,
    /// Falls back to `CINEDEX_VECTOR_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Per-request timeout.
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_vector_backend() -> VectorBackendKind {
    VectorBackendKind::Qdrant
}

fn default_vector_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_store_timeout_secs() -> u64 {
    10
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: default_vector_backend(),
            url: default_vector_url(),
            api_key: None,
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

/// Batching and filter settings for the indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Points per upsert request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Pause after each flushed batch, to stay under provider rate limits.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    /// Showtimes starting further out than this are not indexed.
    #[serde(default = "default_showtime_horizon_days")]
    pub showtime_horizon_days: i64,
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay_ms() -> u64 {
    150
}

fn default_showtime_horizon_days() -> i64 {
    30
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            showtime_horizon_days: default_showtime_horizon_days(),
        }
    }
}

/// Debounce settings for the re-index scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Quiet period after the last change event before a collection is re-indexed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    5_000
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl SchedulerConfig {
    /// The debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Builds the embedding provider selected by `config`.
pub fn create_embedding_provider(config: &EmbeddingConfig) -> CinedexResult<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingBackend::Local => Ok(Arc::new(LocalEmbedding::new(config.dimension))),
        EmbeddingBackend::Gemini | EmbeddingBackend::OpenAi => {
            Ok(Arc::new(HttpEmbedding::new(config.clone())?))
        }
    }
}

/// Builds the vector store selected by `config`.
pub fn create_vector_store(config: &VectorStoreConfig) -> CinedexResult<Arc<dyn VectorStore>> {
    match config.backend {
        VectorBackendKind::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
        VectorBackendKind::Qdrant => Ok(Arc::new(QdrantStore::new(config)?)),
    }
}
