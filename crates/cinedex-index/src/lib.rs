//! Vector indexing and hybrid retrieval for the Cinedex platform.
//!
//! Keeps one vector collection per entity type in step with the system of
//! record and answers free-text queries by combining semantic and keyword
//! search.
//!
//! # Main types
//!
//! - [`EmbeddingProvider`]: Trait for turning text into vectors.
//! - [`VectorStore`]: Trait for named-collection vector storage.
//! - [`EntityRepository`]: Trait for read access to the system of record.
//! - [`Indexer`]: Projects, embeds and upserts records in batches.
//! - [`Reconciler`]: Startup count check that resets drifted collections.
//! - [`ReindexScheduler`]: Debounces change events into re-index passes.
//! - [`HybridSearchEngine`]: Vector + keyword search with merged ranking.

/// Settings for providers, stores, indexing and scheduling.
pub mod config;
/// Rendering of search hits into a textual context block.
pub mod context;
/// Embedding provider trait, local and HTTP implementations.
pub mod embedding;
/// Batch indexing of one collection.
pub mod indexer;
/// Lexical scoring of keyword hits.
pub mod keyword;
/// Query and text normalization.
pub mod normalize;
/// Record-to-text projection.
pub mod projector;
/// Qdrant REST vector store.
pub mod qdrant;
/// Startup drift reconciliation.
pub mod reconciler;
/// Read-only access to the system of record.
pub mod repository;
/// Debounced re-index scheduling.
pub mod scheduler;
/// Vector and hybrid search.
pub mod search;
/// Vector store trait and in-memory implementation.
pub mod store;

pub use config::{
    create_embedding_provider, create_vector_store, EmbeddingBackend, EmbeddingConfig,
    IndexerConfig, SchedulerConfig, VectorBackendKind, VectorStoreConfig,
};
pub use embedding::{EmbeddingProvider, HttpEmbedding, LocalEmbedding};
pub use indexer::{IndexSummary, Indexer, IndexerSettings};
pub use qdrant::QdrantStore;
pub use reconciler::{Reconciler, SyncOutcome};
pub use repository::{EntityRepository, FileRepository, InMemoryRepository, Snapshot};
pub use scheduler::ReindexScheduler;
pub use search::{HybridSearchEngine, MergedResult, ResultSource, SearchResponse};
pub use store::{InMemoryVectorStore, IndexPoint, PointId, SearchResult, VectorStore};
