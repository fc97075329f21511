use async_trait::async_trait;
use cinedex_core::{CinedexError, CinedexResult, EntityRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Identifier of a point inside a collection.
///
/// Entity points always use [`PointId::Num`] holding the relational primary
/// key; the UUID form exists because the store's wire contract allows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointId {
    /// Integer id.
    Num(u64),
    /// UUID id.
    Uuid(Uuid),
}

impl From<u64> for PointId {
    fn from(id: u64) -> Self {
        PointId::Num(id)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Num(n) => write!(f, "{n}"),
            PointId::Uuid(u) => write!(f, "{u}"),
        }
    }
}

/// A vector together with the record it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexPoint {
    /// Point id; the record's primary key.
    pub id: PointId,
    /// Embedding of the projected record text.
    pub vector: Vec<f32>,
    /// The record itself, returned with search hits.
    pub payload: EntityRecord,
}

impl IndexPoint {
    /// Builds the point for `record`, keyed by its primary key.
    pub fn for_record(record: EntityRecord, vector: Vec<f32>) -> Self {
        Self {
            id: PointId::Num(record.id()),
            vector,
            payload: record,
        }
    }
}

/// A nearest-neighbour hit. Higher `score` is more similar.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Id of the matched point.
    pub id: PointId,
    /// Cosine similarity to the query vector.
    pub score: f32,
    /// Stored record.
    pub payload: EntityRecord,
}

/// Named-collection vector storage.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Create a cosine-distance collection. An existing collection is not an error.
    async fn create_collection(&self, collection: &str, vector_size: usize) -> CinedexResult<()>;

    /// Drop a collection and all its points. A missing collection is not an error.
    async fn delete_collection(&self, collection: &str) -> CinedexResult<()>;

    /// Insert or overwrite points by id.
    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> CinedexResult<()>;

    /// Remove points by id. Unknown ids are ignored.
    async fn delete(&self, collection: &str, ids: &[PointId]) -> CinedexResult<()>;

    /// Number of points. A missing collection counts as empty.
    async fn count(&self, collection: &str) -> CinedexResult<usize>;

    /// Ids of every stored point. A missing collection counts as empty.
    async fn list_ids(&self, collection: &str) -> CinedexResult<Vec<PointId>>;

    /// Top-`limit` points by cosine similarity to `vector`.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> CinedexResult<Vec<SearchResult>>;
}

struct Collection {
    vector_size: usize,
    points: BTreeMap<PointId, IndexPoint>,
}

/// In-memory vector store using brute-force cosine similarity.
/// Suitable for tests and small local datasets.
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Creates an empty store with no collections.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// A copy of one stored point, if present.
    pub async fn get(&self, collection: &str, id: PointId) -> Option<IndexPoint> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|c| c.points.get(&id))
            .cloned()
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(collection: &str) -> CinedexError {
    CinedexError::VectorStore(format!("Collection `{collection}` not found"))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn create_collection(&self, collection: &str, vector_size: usize) -> CinedexResult<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection {
                vector_size,
                points: BTreeMap::new(),
            });
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> CinedexResult<()> {
        let mut collections = self.collections.write().await;
        collections.remove(collection);
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> CinedexResult<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;

        if let Some(bad) = points.iter().find(|p| p.vector.len() != target.vector_size) {
            return Err(CinedexError::VectorStore(format!(
                "Point {} has dimension {}, collection `{collection}` expects {}",
                bad.id,
                bad.vector.len(),
                target.vector_size
            )));
        }

        for point in points {
            target.points.insert(point.id, point);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, ids: &[PointId]) -> CinedexResult<()> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| missing(collection))?;
        for id in ids {
            target.points.remove(id);
        }
        Ok(())
    }

    async fn count(&self, collection: &str) -> CinedexResult<usize> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map_or(0, |c| c.points.len()))
    }

    async fn list_ids(&self, collection: &str) -> CinedexResult<Vec<PointId>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.points.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> CinedexResult<Vec<SearchResult>> {
        if vector.is_empty() {
            return Err(CinedexError::VectorStore("Empty query vector".to_string()));
        }

        let collections = self.collections.read().await;
        let target = collections.get(collection).ok_or_else(|| missing(collection))?;

        let mut scored: Vec<SearchResult> = target
            .points
            .values()
            .map(|p| SearchResult {
                id: p.id,
                score: cosine_similarity(vector, &p.vector),
                payload: p.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }
}

/// Cosine similarity between two vectors; 0 when either is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
