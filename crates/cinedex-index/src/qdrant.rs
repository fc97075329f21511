use crate::config::VectorStoreConfig;
use crate::store::{IndexPoint, PointId, SearchResult, VectorStore};
use async_trait::async_trait;
use cinedex_core::{CinedexError, CinedexResult, EntityRecord};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Page size used when scrolling point ids.
const SCROLL_PAGE: usize = 256;

/// Vector store backed by a Qdrant server over its REST API.
pub struct QdrantStore {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CountResult {
    count: usize,
}

#[derive(Deserialize)]
struct ScrollPage {
    points: Vec<PointRef>,
    next_page_offset: Option<PointId>,
}

#[derive(Deserialize)]
struct PointRef {
    id: PointId,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: PointId,
    score: f32,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

impl QdrantStore {
    /// Builds the HTTP client; no request is sent until the first operation.
    pub fn new(config: &VectorStoreConfig) -> CinedexResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CinedexError::Http(e.to_string()))?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/collections/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let request = self.http.request(method, url);
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> CinedexResult<(StatusCode, String)> {
        let resp = request
            .send()
            .await
            .map_err(|e| CinedexError::VectorStore(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CinedexError::VectorStore(e.to_string()))?;
        Ok((status, body))
    }

    fn check(op: &str, collection: &str, status: StatusCode, body: &str) -> CinedexResult<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(CinedexError::VectorStore(format!(
                "Qdrant {op} on `{collection}` failed with {status}: {body}"
            )))
        }
    }

    fn parse<T: DeserializeOwned>(body: &str) -> CinedexResult<T> {
        let envelope: Envelope<T> = serde_json::from_str(body)
            .map_err(|e| CinedexError::VectorStore(format!("Unexpected Qdrant response: {e}")))?;
        Ok(envelope.result)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn name(&self) -> &str {
        "qdrant"
    }

    async fn create_collection(&self, collection: &str, vector_size: usize) -> CinedexResult<()> {
        let body = serde_json::json!({
            "vectors": { "size": vector_size, "distance": "Cosine" }
        });
        let (status, text) = self
            .send(self.request(reqwest::Method::PUT, &self.url(collection)).json(&body))
            .await?;

        if status == StatusCode::CONFLICT || text.contains("already exists") {
            debug!(collection, "Collection already exists");
            return Ok(());
        }
        Self::check("create collection", collection, status, &text)
    }

    async fn delete_collection(&self, collection: &str) -> CinedexResult<()> {
        let (status, text) = self
            .send(self.request(reqwest::Method::DELETE, &self.url(collection)))
            .await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check("delete collection", collection, status, &text)
    }

    async fn upsert(&self, collection: &str, points: Vec<IndexPoint>) -> CinedexResult<()> {
        if points.is_empty() {
            return Ok(());
        }
        let body = serde_json::json!({ "points": points });
        let url = format!("{}?wait=true", self.url(&format!("{collection}/points")));
        let (status, text) = self
            .send(self.request(reqwest::Method::PUT, &url).json(&body))
            .await?;
        Self::check("upsert", collection, status, &text)
    }

    async fn delete(&self, collection: &str, ids: &[PointId]) -> CinedexResult<()> {
        let body = serde_json::json!({ "points": ids });
        let url = format!("{}?wait=true", self.url(&format!("{collection}/points/delete")));
        let (status, text) = self
            .send(self.request(reqwest::Method::POST, &url).json(&body))
            .await?;
        Self::check("delete points", collection, status, &text)
    }

    async fn count(&self, collection: &str) -> CinedexResult<usize> {
        let body = serde_json::json!({ "exact": true });
        let url = self.url(&format!("{collection}/points/count"));
        let (status, text) = self
            .send(self.request(reqwest::Method::POST, &url).json(&body))
            .await?;

        if status == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        Self::check("count", collection, status, &text)?;
        Ok(Self::parse::<CountResult>(&text)?.count)
    }

    async fn list_ids(&self, collection: &str) -> CinedexResult<Vec<PointId>> {
        let url = self.url(&format!("{collection}/points/scroll"));
        let mut ids = Vec::new();
        let mut offset: Option<PointId> = None;

        loop {
            let mut body = serde_json::json!({
                "limit": SCROLL_PAGE,
                "with_payload": false,
                "with_vector": false,
            });
            if let Some(offset) = offset {
                body["offset"] = serde_json::json!(offset);
            }

            let (status, text) = self
                .send(self.request(reqwest::Method::POST, &url).json(&body))
                .await?;
            if status == StatusCode::NOT_FOUND {
                return Ok(Vec::new());
            }
            Self::check("scroll", collection, status, &text)?;

            let page: ScrollPage = Self::parse(&text)?;
            ids.extend(page.points.into_iter().map(|p| p.id));
            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        debug!(collection, count = ids.len(), "Listed point ids");
        Ok(ids)
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> CinedexResult<Vec<SearchResult>> {
        let body = serde_json::json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });
        let url = self.url(&format!("{collection}/points/search"));
        let (status, text) = self
            .send(self.request(reqwest::Method::POST, &url).json(&body))
            .await?;
        Self::check("search", collection, status, &text)?;

        let hits: Vec<ScoredPoint> = Self::parse(&text)?;
        let results = hits
            .into_iter()
            .filter_map(|hit| {
                let payload = hit.payload?;
                match serde_json::from_value::<EntityRecord>(payload) {
                    Ok(record) => Some(SearchResult {
                        id: hit.id,
                        score: hit.score,
                        payload: record,
                    }),
                    Err(e) => {
                        warn!(collection, id = %hit.id, error = %e, "Skipping point with unreadable payload");
                        None
                    }
                }
            })
            .collect();
        Ok(results)
    }
}
