use crate::context::render_context;
use crate::embedding::EmbeddingProvider;
use crate::indexer::{qualifying_filter, IndexerSettings};
use crate::keyword::score_record;
use crate::normalize::normalize_query;
use crate::repository::EntityRepository;
use crate::store::{SearchResult, VectorStore};
use chrono::Utc;
use cinedex_core::{CinedexResult, EntityRecord, EntityType};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

const VECTOR_WEIGHT: f32 = 0.6;
const KEYWORD_WEIGHT: f32 = 0.4;
const AGREEMENT_BONUS: f32 = 0.1;

/// Which retrieval path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    /// Found by the vector path only.
    Vector,
    /// Found by the keyword path only.
    Keyword,
    /// Found by both paths.
    Hybrid,
}

/// One ranked source returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedResult {
    /// Collection the record belongs to; serialized as `type`.
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    /// Primary key.
    pub id: u64,
    /// Title, name or code of the record.
    pub title: String,
    /// Cosine similarity, when the vector path found it.
    pub vector_score: Option<f32>,
    /// Lexical score, when the keyword path found it.
    pub keyword_score: Option<f32>,
    /// Ranking key.
    pub combined_score: f32,
    /// Which path produced the result.
    pub source: ResultSource,
    /// The full record.
    pub data: EntityRecord,
}

impl MergedResult {
    fn from_vector(hit: SearchResult) -> Self {
        Self {
            entity_type: hit.payload.entity_type(),
            id: hit.payload.id(),
            title: hit.payload.title(),
            vector_score: Some(hit.score),
            keyword_score: None,
            combined_score: hit.score,
            source: ResultSource::Vector,
            data: hit.payload,
        }
    }

    fn from_keyword(record: EntityRecord, score: f32) -> Self {
        Self {
            entity_type: record.entity_type(),
            id: record.id(),
            title: record.title(),
            vector_score: None,
            keyword_score: Some(score),
            combined_score: score,
            source: ResultSource::Keyword,
            data: record,
        }
    }

    fn key(&self) -> (EntityType, u64) {
        (self.entity_type, self.id)
    }
}

/// Rendered context plus the ranked sources it was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Sources rendered as text, grouped by type.
    pub context: String,
    /// Ranked results, best first.
    pub sources: Vec<MergedResult>,
}

impl SearchResponse {
    fn from_sources(sources: Vec<MergedResult>) -> Self {
        let context = render_context(sources.iter().map(|s| &s.data));
        Self { context, sources }
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Answers free-text queries from the vector collections and the system
/// of record.
///
/// The keyword path only considers rows that qualify for indexing, so it
/// never surfaces an expired promotion or a showtime the vector path has
/// dropped.
pub struct HybridSearchEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    repository: Arc<dyn EntityRepository>,
    showtime_horizon: chrono::Duration,
}

impl HybridSearchEngine {
    /// Wires an engine with the default showtime horizon.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        repository: Arc<dyn EntityRepository>,
    ) -> Self {
        Self {
            embedder,
            store,
            repository,
            showtime_horizon: IndexerSettings::default().showtime_horizon,
        }
    }

    /// Uses the same horizon as the indexer that fills the collections.
    pub fn with_showtime_horizon(mut self, horizon: chrono::Duration) -> Self {
        self.showtime_horizon = horizon;
        self
    }

    /// Semantic search across every collection.
    ///
    /// A collection whose search fails contributes no hits. Fails only when
    /// the query cannot be embedded.
    pub async fn search(&self, query: &str, limit: usize) -> CinedexResult<SearchResponse> {
        let limit = limit.max(1);
        let hits = self.vector_hits(query, limit).await?;
        let sources = hits.into_iter().map(MergedResult::from_vector).collect();
        Ok(SearchResponse::from_sources(sources))
    }

    /// Vector and keyword search merged into one ranking.
    ///
    /// Results found by both paths score `0.6 * vector + 0.4 * keyword + 0.1`.
    /// If the query cannot be embedded only keyword results are returned.
    pub async fn hybrid_search(&self, query: &str, limit: usize) -> SearchResponse {
        let limit = limit.max(1);
        let (vector, keyword) =
            tokio::join!(self.vector_hits(query, limit), self.keyword_hits(query, limit));

        let vector = vector.unwrap_or_else(|e| {
            warn!(error = %e, "Vector path failed, falling back to keyword results");
            Vec::new()
        });
        debug!(vector = vector.len(), keyword = keyword.len(), "Merging hybrid results");

        let mut sources = merge(vector, keyword);
        sources.truncate(2 * limit);
        SearchResponse::from_sources(sources)
    }

    /// Keyword path on its own, ranked by lexical score.
    pub async fn keyword_search(&self, query: &str, limit: usize) -> SearchResponse {
        let limit = limit.max(1);
        let mut sources = merge(Vec::new(), self.keyword_hits(query, limit).await);
        sources.truncate(2 * limit);
        SearchResponse::from_sources(sources)
    }

    async fn vector_hits(&self, query: &str, limit: usize) -> CinedexResult<Vec<SearchResult>> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(&normalized).await?;

        let per_collection = join_all(EntityType::ALL.map(|entity| {
            let vector = &vector;
            async move {
                let collection = entity.collection_name();
                match self.store.search(collection, vector, limit).await {
                    Ok(hits) => hits,
                    Err(e) => {
                        warn!(collection, error = %e, "Collection search failed, skipping");
                        Vec::new()
                    }
                }
            }
        }))
        .await;

        let mut hits: Vec<SearchResult> = per_collection.into_iter().flatten().collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(3 * limit);
        Ok(hits)
    }

    async fn keyword_hits(&self, query: &str, limit: usize) -> Vec<(EntityRecord, f32)> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let now = Utc::now();
        let per_type = join_all(EntityType::ALL.map(|entity| async move {
            let filter = qualifying_filter(entity, now, self.showtime_horizon);
            match self.repository.keyword_search(entity, filter, query, limit).await {
                Ok(records) => records,
                Err(e) => {
                    warn!(collection = entity.collection_name(), error = %e, "Keyword search failed, skipping");
                    Vec::new()
                }
            }
        }))
        .await;

        per_type
            .into_iter()
            .flatten()
            .map(|record| {
                let score = score_record(query, &record);
                (record, score)
            })
            .collect()
    }
}

/// Merges both result sets keyed by `(type, id)` and sorts by combined score.
fn merge(vector: Vec<SearchResult>, keyword: Vec<(EntityRecord, f32)>) -> Vec<MergedResult> {
    let mut merged: HashMap<(EntityType, u64), MergedResult> = HashMap::new();

    for hit in vector {
        let result = MergedResult::from_vector(hit);
        merged.entry(result.key()).or_insert(result);
    }

    for (record, score) in keyword {
        let key = (record.entity_type(), record.id());
        match merged.get_mut(&key) {
            Some(existing) if existing.source == ResultSource::Vector => {
                let v = existing.vector_score.unwrap_or(0.0);
                existing.keyword_score = Some(score);
                existing.combined_score = VECTOR_WEIGHT * v + KEYWORD_WEIGHT * score + AGREEMENT_BONUS;
                existing.source = ResultSource::Hybrid;
                existing.data = record;
            }
            Some(_) => {}
            None => {
                merged.insert(key, MergedResult::from_keyword(record, score));
            }
        }
    }

    let mut sources: Vec<MergedResult> = merged.into_values().collect();
    sources.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key().cmp(&b.key()))
    });
    sources
}
