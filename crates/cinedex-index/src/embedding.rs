use crate::config::{EmbeddingBackend, EmbeddingConfig};
use crate::normalize::normalize_query;
use async_trait::async_trait;
use cinedex_core::{CinedexError, CinedexResult};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::HashMap;

/// Turns text into fixed-length vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds one text. Credential problems are reported as config errors.
    async fn embed(&self, text: &str) -> CinedexResult<Vec<f32>>;

    /// Dimension of the embedding vectors produced by this provider.
    fn dimension(&self) -> usize;

    /// Short provider name for logs.
    fn name(&self) -> &str;
}

/// Local bag-of-words embedding (no external API needed).
///
/// Text is normalized first, so accented and unaccented spellings of the
/// same words land on the same dimensions.
pub struct LocalEmbedding {
    dimension: usize,
}

impl LocalEmbedding {
    /// A hashing embedder producing `dimension`-long unit vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> CinedexResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(CinedexError::Embedding("Cannot embed empty text".to_string()));
        }

        let mut vector = vec![0.0f32; self.dimension];

        let normalized = normalize_query(text);
        let words: Vec<&str> = normalized
            .split(' ')
            .filter(|w| w.chars().count() > 1)
            .collect();

        let mut freq: HashMap<&str, f32> = HashMap::new();
        for word in &words {
            *freq.entry(word).or_insert(0.0) += 1.0;
        }

        let total = words.len() as f32;
        if total == 0.0 {
            return Ok(vector);
        }

        // Three hash positions per word spread collisions out.
        for (word, count) in &freq {
            let tf = count / total;
            let hash1 = fnv1a(word.as_bytes()) as usize;
            let hash2 = fnv1a(&[word.as_bytes(), &[1u8]].concat()) as usize;
            let hash3 = fnv1a(&[word.as_bytes(), &[2u8]].concat()) as usize;

            vector[hash1 % self.dimension] += tf;
            vector[hash2 % self.dimension] += tf * 0.7;
            vector[hash3 % self.dimension] += tf * 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "local"
    }
}

fn fnv1a(data: &[u8]) -> u32 {
    let mut hash: u32 = 2166136261;
    for &byte in data {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct GeminiEmbeddingResponse {
    embedding: GeminiValues,
}

#[derive(Deserialize)]
struct GeminiValues {
    values: Vec<f32>,
}

/// Remote embedding provider speaking the OpenAI or Gemini wire format.
pub struct HttpEmbedding {
    config: EmbeddingConfig,
    http: reqwest::Client,
}

impl HttpEmbedding {
    /// Builds the HTTP client. A missing API key is reported on first use.
    pub fn new(config: EmbeddingConfig) -> CinedexResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| CinedexError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn api_key(&self) -> CinedexResult<&str> {
        if self.config.api_key.trim().is_empty() {
            return Err(CinedexError::Config(format!(
                "No API key configured for {} embeddings",
                self.name()
            )));
        }
        Ok(&self.config.api_key)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> CinedexResult<reqwest::Response> {
        let resp = request
            .send()
            .await
            .map_err(|e| CinedexError::Embedding(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let error_body = resp
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        let message = format!("{} embedding API error {}: {}", self.name(), status, error_body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(CinedexError::Config(message))
        } else {
            Err(CinedexError::Embedding(message))
        }
    }

    async fn embed_openai(&self, text: &str) -> CinedexResult<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.config.base_url());
        let body = serde_json::json!({
            "model": self.config.model,
            "input": text,
            "dimensions": self.config.dimension,
        });

        let request = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key()?))
            .json(&body);

        let parsed: OpenAiEmbeddingResponse = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| CinedexError::Embedding(e.to_string()))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| CinedexError::Embedding("Response contained no embedding".to_string()))
    }

    async fn embed_gemini(&self, text: &str) -> CinedexResult<Vec<f32>> {
        let url = format!(
            "{}/v1beta/models/{}:embedContent",
            self.config.base_url(),
            self.config.model
        );
        let body = serde_json::json!({
            "model": format!("models/{}", self.config.model),
            "content": { "parts": [{ "text": text }] },
            "outputDimensionality": self.config.dimension,
        });

        let request = self
            .http
            .post(&url)
            .query(&[("key", self.api_key()?)])
            .json(&body);

        let parsed: GeminiEmbeddingResponse = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| CinedexError::Embedding(e.to_string()))?;

        Ok(parsed.embedding.values)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, text: &str) -> CinedexResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(CinedexError::Embedding("Cannot embed empty text".to_string()));
        }

        match self.config.provider {
            EmbeddingBackend::OpenAi => self.embed_openai(text).await,
            EmbeddingBackend::Gemini => self.embed_gemini(text).await,
            EmbeddingBackend::Local => Err(CinedexError::Config(
                "The local backend is not served over HTTP".to_string(),
            )),
        }
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn name(&self) -> &str {
        match self.config.provider {
            EmbeddingBackend::OpenAi => "openai",
            EmbeddingBackend::Gemini => "gemini",
            EmbeddingBackend::Local => "local",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::cosine_similarity;

    #[tokio::test]
    async fn test_local_embedding_dimension() {
        let emb = LocalEmbedding::new(128);
        assert_eq!(emb.dimension(), 128);
        let vec = emb.embed("hello world").await.unwrap();
        assert_eq!(vec.len(), 128);
    }

    #[tokio::test]
    async fn test_local_embedding_normalized() {
        let emb = LocalEmbedding::default();
        let vec = emb.embed("Suất chiếu IMAX tối nay").await.unwrap();
        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_local_embedding_ignores_diacritics() {
        let emb = LocalEmbedding::default();
        let accented = emb.embed("Hành Động").await.unwrap();
        let plain = emb.embed("hanh dong").await.unwrap();
        assert_eq!(accented, plain);
    }

    #[tokio::test]
    async fn test_local_embedding_similar_texts() {
        let emb = LocalEmbedding::default();
        let v1 = emb.embed("phim hanh dong").await.unwrap();
        let v2 = emb.embed("Hành Động Việt").await.unwrap();
        let v3 = emb.embed("khuyến mãi cuối tuần").await.unwrap();

        let sim_12 = cosine_similarity(&v1, &v2);
        let sim_13 = cosine_similarity(&v1, &v3);
        assert!(sim_12 > sim_13, "sim_12={sim_12} sim_13={sim_13}");
    }

    #[tokio::test]
    async fn test_local_embedding_empty() {
        let emb = LocalEmbedding::default();
        assert!(emb.embed("").await.is_err());
        assert!(emb.embed("   ").await.is_err());
    }

    #[tokio::test]
    async fn test_http_embedding_requires_key() {
        let emb = HttpEmbedding::new(EmbeddingConfig {
            provider: EmbeddingBackend::OpenAi,
            base_url: Some("http://127.0.0.1:9".into()),
            ..Default::default()
        })
        .unwrap();
        let err = emb.embed("dune").await.unwrap_err();
        assert!(err.is_config());
    }
}
