use cinedex_index::{EmbeddingConfig, IndexerConfig, SchedulerConfig, VectorStoreConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable consulted when `[embedding] api_key` is empty.
pub const EMBEDDING_KEY_ENV: &str = "CINEDEX_EMBEDDING_API_KEY";
/// Environment variable consulted when `[vector_store] api_key` is unset.
pub const VECTOR_KEY_ENV: &str = "CINEDEX_VECTOR_API_KEY";

/// Top-level `cinedex.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CinedexConfig {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub vector_store: VectorStoreConfig,
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer keys for `/index/*` and `/events`. Empty disables auth.
    #[serde(default)]
    pub api_keys: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_keys: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Location of the system-of-record snapshot.
#[derive(Debug, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default = "default_repository_path")]
    pub path: PathBuf,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repository_path(),
        }
    }
}

fn default_repository_path() -> PathBuf {
    PathBuf::from("data/catalog.json")
}

impl CinedexConfig {
    /// Parses a TOML document and applies environment fallbacks.
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let mut config: Self = toml::from_str(raw)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Reads `path`, or returns defaults (plus environment) when it does not exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env(|name| std::env::var(name).ok());
            return Ok(config);
        }

        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;
        Self::from_toml(&raw)
    }

    /// Fills empty credentials from `lookup`. Values from the file win.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.embedding.api_key.trim().is_empty() {
            if let Some(key) = lookup(EMBEDDING_KEY_ENV).filter(|k| !k.trim().is_empty()) {
                self.embedding.api_key = key;
            }
        }
        if self.vector_store.api_key.is_none() {
            self.vector_store.api_key = lookup(VECTOR_KEY_ENV).filter(|k| !k.trim().is_empty());
        }
    }

    /// Relative repository paths are resolved against the config file's directory.
    pub fn resolve_paths(&mut self, config_path: &Path) {
        if self.repository.path.is_relative() {
            if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
                self.repository.path = dir.join(&self.repository.path);
            }
        }
    }
}
