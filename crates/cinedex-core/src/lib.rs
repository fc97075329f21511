//! Core types and error definitions for the Cinedex indexing pipeline.
//!
//! This crate provides the foundational types shared across all Cinedex crates:
//! the error enum, the closed set of indexed entity types, the relational
//! records mirrored into the vector store, and the change events emitted by
//! the system of record.
//!
//! # Main types
//!
//! - [`CinedexError`]: One error enum shared by every Cinedex crate.
//! - [`CinedexResult`]: `Result<T, CinedexError>`.
//! - [`EntityType`]: The four indexed entity types, one collection each.
//! - [`EntityRecord`]: A relational record; also the tagged payload stored
//!   alongside every vector.
//! - [`RecordFilter`]: Qualifying filters understood by repositories.
//! - [`ChangeEvent`]: A created/updated/deleted notification for one entity.

/// Change events emitted by the system of record.
pub mod event;
/// Entity types and their collection names.
pub mod entity;
/// Relational record shapes and filters.
pub mod record;

pub use entity::EntityType;
pub use event::{ChangeEvent, ChangeKind};
pub use record::{Cinema, EntityRecord, Movie, MovieStatus, Promotion, RecordFilter, Showtime};

// --- Error types ---

/// Top-level error type for Cinedex.
///
/// Each variant corresponds to a collaborator or stage that can fail.
#[derive(Debug, thiserror::Error)]
pub enum CinedexError {
    /// The embedding provider rejected or failed a request.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The vector store rejected or failed a request.
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// The system of record could not be read.
    #[error("Repository error: {0}")]
    Repository(String),

    /// A record could not be rendered into search text.
    #[error("Projection error: {0}")]
    Projection(String),

    /// Missing credentials, wrong dimensionality, or an unparsable setting.
    #[error("Config error: {0}")]
    Config(String),

    /// An outbound HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CinedexError {
    /// Whether this error stems from configuration rather than a transient
    /// external failure. Configuration errors abort the whole operation.
    pub fn is_config(&self) -> bool {
        matches!(self, CinedexError::Config(_))
    }
}

/// A convenience `Result` alias using [`CinedexError`].
pub type CinedexResult<T> = Result<T, CinedexError>;
