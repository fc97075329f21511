use crate::config::IndexerConfig;
use crate::embedding::EmbeddingProvider;
use crate::projector::project;
use crate::repository::EntityRepository;
use crate::store::{IndexPoint, PointId, VectorStore};
use chrono::{DateTime, Utc};
use cinedex_core::{CinedexError, CinedexResult, EntityType, RecordFilter};
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Runtime knobs for [`Indexer`].
#[derive(Debug, Clone)]
pub struct IndexerSettings {
    /// Points per upsert request.
    pub batch_size: usize,
    /// Pause after each flushed batch.
    pub batch_delay: Duration,
    /// Showtimes starting later than now + horizon do not qualify.
    pub showtime_horizon: chrono::Duration,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self::from(&IndexerConfig::default())
    }
}

impl From<&IndexerConfig> for IndexerSettings {
    fn from(config: &IndexerConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            showtime_horizon: chrono::Duration::days(config.showtime_horizon_days),
        }
    }
}

/// Which records of `entity` belong in its collection at instant `now`.
///
/// Shared by indexing and keyword search so both paths see the same rows.
pub fn qualifying_filter(
    entity: EntityType,
    now: DateTime<Utc>,
    showtime_horizon: chrono::Duration,
) -> RecordFilter {
    match entity {
        EntityType::Movies | EntityType::Cinemas => RecordFilter::Active,
        EntityType::Promotions => RecordFilter::NotExpired(now),
        EntityType::Showtimes => RecordFilter::Upcoming {
            from: now,
            to: now + showtime_horizon,
        },
    }
}

/// Points written per collection by a full pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Points in `movies`.
    pub movies: usize,
    /// Points in `showtimes`.
    pub showtimes: usize,
    /// Points in `promotions`.
    pub promotions: usize,
    /// Points in `cinemas`.
    pub cinemas: usize,
}

impl IndexSummary {
    /// Count recorded for `entity`.
    pub fn get(&self, entity: EntityType) -> usize {
        match entity {
            EntityType::Movies => self.movies,
            EntityType::Showtimes => self.showtimes,
            EntityType::Promotions => self.promotions,
            EntityType::Cinemas => self.cinemas,
        }
    }

    /// Records the count for `entity`.
    pub fn set(&mut self, entity: EntityType, count: usize) {
        match entity {
            EntityType::Movies => self.movies = count,
            EntityType::Showtimes => self.showtimes = count,
            EntityType::Promotions => self.promotions = count,
            EntityType::Cinemas => self.cinemas = count,
        }
    }

    /// Sum over all collections.
    pub fn total(&self) -> usize {
        self.movies + self.showtimes + self.promotions + self.cinemas
    }
}

/// Keeps vector collections consistent with the system of record.
///
/// The only component that writes to the [`VectorStore`].
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    repository: Arc<dyn EntityRepository>,
    settings: IndexerSettings,
}

impl Indexer {
    /// Wires an indexer over the given provider, store and repository.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        repository: Arc<dyn EntityRepository>,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            repository,
            settings,
        }
    }

    /// Dimensionality every collection is created with.
    pub fn vector_size(&self) -> usize {
        self.embedder.dimension()
    }

    /// The qualifying filter for `entity` at the current instant.
    pub fn filter_for(&self, entity: EntityType) -> RecordFilter {
        qualifying_filter(entity, Utc::now(), self.settings.showtime_horizon)
    }

    /// Projects, embeds and upserts every qualifying record of `entity`,
    /// then removes points whose record no longer qualifies.
    ///
    /// Records that fail to project or embed are skipped. Configuration
    /// errors (credentials, dimensionality) and store errors abort the pass.
    /// Returns the number of points written.
    pub async fn reindex_all(&self, entity: EntityType) -> CinedexResult<usize> {
        let collection = entity.collection_name();
        let vector_size = self.vector_size();
        let records = self.repository.fetch(entity, self.filter_for(entity)).await?;
        let qualifying: HashSet<PointId> = records.iter().map(|r| PointId::Num(r.id())).collect();

        info!(collection, records = records.len(), "Reindexing collection");
        self.store.create_collection(collection, vector_size).await?;

        let mut batch: Vec<IndexPoint> = Vec::with_capacity(self.settings.batch_size);
        let mut written = 0usize;
        let mut skipped = 0usize;

        for record in records {
            let id = record.id();
            let text = match project(&record) {
                Ok(text) => text,
                Err(e) => {
                    warn!(collection, id, error = %e, "Skipping record that cannot be projected");
                    skipped += 1;
                    continue;
                }
            };

            let vector = match self.embedder.embed(&text).await {
                Ok(vector) => vector,
                Err(e) if e.is_config() => return Err(e),
                Err(e) => {
                    warn!(collection, id, error = %e, "Skipping record that failed to embed");
                    skipped += 1;
                    continue;
                }
            };

            if vector.len() != vector_size {
                return Err(CinedexError::Config(format!(
                    "Embedding provider `{}` returned {} dimensions, collection `{collection}` expects {vector_size}",
                    self.embedder.name(),
                    vector.len()
                )));
            }

            batch.push(IndexPoint::for_record(record, vector));
            if batch.len() >= self.settings.batch_size {
                written += self.flush(collection, &mut batch).await?;
            }
        }

        if !batch.is_empty() {
            written += self.flush(collection, &mut batch).await?;
        }

        let stale: Vec<PointId> = self
            .store
            .list_ids(collection)
            .await?
            .into_iter()
            .filter(|id| !qualifying.contains(id))
            .collect();
        if !stale.is_empty() {
            self.store.delete(collection, &stale).await?;
        }

        info!(collection, indexed = written, skipped, removed = stale.len(), "Collection reindexed");
        Ok(written)
    }

    async fn flush(&self, collection: &str, batch: &mut Vec<IndexPoint>) -> CinedexResult<usize> {
        let points = std::mem::take(batch);
        let count = points.len();
        self.store.upsert(collection, points).await?;
        debug!(collection, count, "Flushed batch");
        tokio::time::sleep(self.settings.batch_delay).await;
        Ok(count)
    }

    /// Drops and recreates the collection, then reindexes it.
    pub async fn reset_collection(&self, entity: EntityType) -> CinedexResult<usize> {
        let collection = entity.collection_name();
        info!(collection, "Resetting collection");
        self.store.delete_collection(collection).await?;
        self.store
            .create_collection(collection, self.vector_size())
            .await?;
        self.reindex_all(entity).await
    }

    /// Removes one point.
    pub async fn delete_one(&self, entity: EntityType, id: u64) -> CinedexResult<()> {
        let collection = entity.collection_name();
        self.store.delete(collection, &[PointId::Num(id)]).await?;
        info!(collection, id, "Deleted point");
        Ok(())
    }

    /// Points currently stored for `entity`.
    pub async fn count_in_store(&self, entity: EntityType) -> CinedexResult<usize> {
        self.store.count(entity.collection_name()).await
    }

    /// Qualifying records in the system of record, using the same filter as
    /// [`Indexer::reindex_all`].
    pub async fn count_in_repository(&self, entity: EntityType) -> CinedexResult<usize> {
        self.repository.count(entity, self.filter_for(entity)).await
    }

    /// Creates every collection that does not exist yet.
    pub async fn ensure_collections(&self) -> CinedexResult<()> {
        let vector_size = self.vector_size();
        for entity in EntityType::ALL {
            self.store
                .create_collection(entity.collection_name(), vector_size)
                .await?;
        }
        debug!(vector_size, store = self.store.name(), "Collections ensured");
        Ok(())
    }

    /// Resets every collection concurrently.
    pub async fn reindex_everything(&self) -> CinedexResult<IndexSummary> {
        let counts = try_join_all(EntityType::ALL.map(|e| self.reset_collection(e))).await?;
        let mut summary = IndexSummary::default();
        for (entity, count) in EntityType::ALL.into_iter().zip(counts) {
            summary.set(entity, count);
        }
        info!(total = summary.total(), "All collections reindexed");
        Ok(summary)
    }
}
