use async_trait::async_trait;
use cinedex_core::{
    Cinema, CinedexError, CinedexResult, EntityRecord, EntityType, Movie, Promotion, RecordFilter,
    Showtime,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Read access to the system of record.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Rows of `entity` passing `filter`, in primary-key order.
    async fn fetch(&self, entity: EntityType, filter: RecordFilter) -> CinedexResult<Vec<EntityRecord>>;

    /// Number of rows of `entity` passing `filter`.
    async fn count(&self, entity: EntityType, filter: RecordFilter) -> CinedexResult<usize> {
        Ok(self.fetch(entity, filter).await?.len())
    }

    /// Rows of `entity` passing `filter` whose text columns contain `query`,
    /// case-insensitively, at most `limit` of them.
    async fn keyword_search(
        &self,
        entity: EntityType,
        filter: RecordFilter,
        query: &str,
        limit: usize,
    ) -> CinedexResult<Vec<EntityRecord>> {
        let needle = query.trim().to_lowercase();
        let rows = self.fetch(entity, filter).await?;
        Ok(rows
            .into_iter()
            .filter(|r| {
                r.keyword_fields()
                    .iter()
                    .any(|f| f.to_lowercase().contains(&needle))
            })
            .take(limit)
            .collect())
    }
}

fn select(records: &[EntityRecord], entity: EntityType, filter: RecordFilter) -> Vec<EntityRecord> {
    let mut rows: Vec<EntityRecord> = records
        .iter()
        .filter(|r| r.entity_type() == entity && filter.matches(r))
        .cloned()
        .collect();
    rows.sort_by_key(|r| r.id());
    rows
}

/// Repository holding rows in memory. Used by tests and demos.
pub struct InMemoryRepository {
    records: RwLock<Vec<EntityRecord>>,
}

impl InMemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// A repository pre-loaded with `records`.
    pub fn with_records(records: Vec<EntityRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Inserts a row, replacing any row with the same type and id.
    pub async fn upsert(&self, record: EntityRecord) {
        let mut records = self.records.write().await;
        records.retain(|r| !(r.entity_type() == record.entity_type() && r.id() == record.id()));
        records.push(record);
    }

    /// Removes a row. Returns whether it existed.
    pub async fn remove(&self, entity: EntityType, id: u64) -> bool {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !(r.entity_type() == entity && r.id() == id));
        records.len() < before
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityRepository for InMemoryRepository {
    async fn fetch(&self, entity: EntityType, filter: RecordFilter) -> CinedexResult<Vec<EntityRecord>> {
        let records = self.records.read().await;
        Ok(select(&records, entity, filter))
    }
}

/// On-disk export of the system of record, one array per entity type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// `movies` rows.
    #[serde(default)]
    pub movies: Vec<Movie>,
    /// `showtimes` rows.
    #[serde(default)]
    pub showtimes: Vec<Showtime>,
    /// `promotions` rows.
    #[serde(default)]
    pub promotions: Vec<Promotion>,
    /// `cinemas` rows.
    #[serde(default)]
    pub cinemas: Vec<Cinema>,
}

impl Snapshot {
    /// Flattens every array into tagged records.
    pub fn into_records(self) -> Vec<EntityRecord> {
        let mut records = Vec::with_capacity(
            self.movies.len() + self.showtimes.len() + self.promotions.len() + self.cinemas.len(),
        );
        records.extend(self.movies.into_iter().map(EntityRecord::Movie));
        records.extend(self.showtimes.into_iter().map(EntityRecord::Showtime));
        records.extend(self.promotions.into_iter().map(EntityRecord::Promotion));
        records.extend(self.cinemas.into_iter().map(EntityRecord::Cinema));
        records
    }
}

/// Repository reading a JSON [`Snapshot`] file.
///
/// The file is re-read on every call so external rewrites are picked up
/// without a restart.
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    /// Reads snapshots from `path`; the file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn load(&self) -> CinedexResult<Vec<EntityRecord>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            CinedexError::Repository(format!("Cannot read {}: {e}", self.path.display()))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&raw).map_err(|e| {
            CinedexError::Repository(format!("Invalid snapshot {}: {e}", self.path.display()))
        })?;
        Ok(snapshot.into_records())
    }
}

#[async_trait]
impl EntityRepository for FileRepository {
    async fn fetch(&self, entity: EntityType, filter: RecordFilter) -> CinedexResult<Vec<EntityRecord>> {
        let records = self.load().await?;
        Ok(select(&records, entity, filter))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn cinema(id: u64, name: &str, city: &str, active: bool) -> EntityRecord {
        EntityRecord::Cinema(Cinema {
            id,
            name: name.into(),
            address: None,
            city: Some(city.into()),
            phone: None,
            description: None,
            room_count: None,
            is_active: active,
        })
    }

    #[tokio::test]
    async fn test_fetch_filters_and_sorts() {
        let repo = InMemoryRepository::with_records(vec![
            cinema(3, "Lotte", "Hà Nội", true),
            cinema(1, "CGV", "Đà Nẵng", true),
            cinema(2, "BHD", "Huế", false),
        ]);

        let active = repo.fetch(EntityType::Cinemas, RecordFilter::Active).await.unwrap();
        let ids: Vec<u64> = active.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![1, 3]);

        assert_eq!(repo.count(EntityType::Cinemas, RecordFilter::All).await.unwrap(), 3);
        assert_eq!(repo.count(EntityType::Movies, RecordFilter::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_keyword_search_case_insensitive_and_limited() {
        let repo = InMemoryRepository::with_records(vec![
            cinema(1, "CGV Vincom", "Hà Nội", true),
            cinema(2, "CGV Aeon", "Hà Nội", true),
            cinema(3, "cgv Landmark", "Hà Nội", false),
        ]);

        let hits = repo
            .keyword_search(EntityType::Cinemas, RecordFilter::Active, "cgv", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let hits = repo
            .keyword_search(EntityType::Cinemas, RecordFilter::Active, "HÀ NỘI", 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), 1);

        let hits = repo
            .keyword_search(EntityType::Cinemas, RecordFilter::All, "cgv", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_keyword_search_honours_expiry_filter() {
        let promo = |id: u64, title: &str, days: i64| {
            EntityRecord::Promotion(Promotion {
                id,
                code: format!("CODE{id}"),
                title: title.into(),
                description: None,
                discount_percent: None,
                discount_amount: None,
                min_order_value: None,
                start_date: None,
                end_date: chrono::Utc::now() + chrono::Duration::days(days),
                is_active: true,
            })
        };
        let repo = InMemoryRepository::with_records(vec![
            promo(1, "Tet sale", 10),
            promo(2, "Tet sale 2023", -30),
        ]);

        let hits = repo
            .keyword_search(
                EntityType::Promotions,
                RecordFilter::NotExpired(chrono::Utc::now()),
                "tet sale",
                10,
            )
            .await
            .unwrap();
        let ids: Vec<u64> = hits.iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_upsert_and_remove() {
        let repo = InMemoryRepository::new();
        repo.upsert(cinema(1, "A", "x", true)).await;
        repo.upsert(cinema(1, "B", "x", true)).await;
        let rows = repo.fetch(EntityType::Cinemas, RecordFilter::All).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title(), "B");

        assert!(repo.remove(EntityType::Cinemas, 1).await);
        assert!(!repo.remove(EntityType::Cinemas, 1).await);
    }

    #[tokio::test]
    async fn test_file_repository_missing_file() {
        let repo = FileRepository::new("/nonexistent/cinedex/snapshot.json");
        let err = repo.fetch(EntityType::Movies, RecordFilter::All).await.unwrap_err();
        assert!(matches!(err, CinedexError::Repository(_)));
    }
}
