//! Declarative configuration sources
//!
//! A source hands out raw YAML documents by namespace and key; parsing and
//! caching happen in [`ConfigStore`](crate::store::ConfigStore).

use crate::store::error::{ConfigError, ConfigKind};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::sync::RwLock;

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("valid key pattern"));

/// Check that a key is safe to use as a document name
pub fn is_valid_key(key: &str) -> bool {
    KEY_PATTERN.is_match(key) && !key.contains("..")
}

/// Trait for configuration backends
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Read the raw document for a key
    async fn read(&self, kind: ConfigKind, key: &str) -> Result<String, ConfigError>;

    /// List all keys in a namespace, sorted
    async fn list(&self, kind: ConfigKind) -> Result<Vec<String>, ConfigError>;
}

/// Reads `<root>/businesses/<id>.yaml` and `<root>/pipelines/<key>.yaml`
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    root: PathBuf,
}

impl FileConfigSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, kind: ConfigKind) -> PathBuf {
        match kind {
            ConfigKind::Business => self.root.join("businesses"),
            ConfigKind::Pipeline => self.root.join("pipelines"),
        }
    }

    /// Path of the document for a key
    pub fn path_for(&self, kind: ConfigKind, key: &str) -> Result<PathBuf, ConfigError> {
        if !is_valid_key(key) {
            return Err(ConfigError::InvalidKey {
                kind,
                key: key.to_string(),
            });
        }
        Ok(self.dir(kind).join(format!("{}.yaml", key)))
    }
}

#[async_trait]
impl ConfigSource for FileConfigSource {
    async fn read(&self, kind: ConfigKind, key: &str) -> Result<String, ConfigError> {
        let path = self.path_for(kind, key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound {
                kind,
                key: key.to_string(),
            }),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    async fn list(&self, kind: ConfigKind) -> Result<Vec<String>, ConfigError> {
        let dir = self.dir(kind);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|source| ConfigError::Read {
                path: dir.clone(),
                source,
            })?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| ConfigError::Read {
                path: dir.clone(),
                source,
            })?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_key(stem) {
                    keys.push(stem.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// In-memory configuration source (for testing or embedding)
#[derive(Default)]
pub struct InMemoryConfigSource {
    documents: RwLock<HashMap<(ConfigKind, String), String>>,
}

impl InMemoryConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a business document
    pub fn with_business(mut self, id: &str, yaml: &str) -> Self {
        self.documents
            .get_mut()
            .insert((ConfigKind::Business, id.to_string()), yaml.to_string());
        self
    }

    /// Add a pipeline document
    pub fn with_pipeline(mut self, key: &str, yaml: &str) -> Self {
        self.documents
            .get_mut()
            .insert((ConfigKind::Pipeline, key.to_string()), yaml.to_string());
        self
    }

    /// Insert or replace a document
    pub async fn insert(&self, kind: ConfigKind, key: &str, yaml: &str) {
        self.documents
            .write()
            .await
            .insert((kind, key.to_string()), yaml.to_string());
    }
}

#[async_trait]
impl ConfigSource for InMemoryConfigSource {
    async fn read(&self, kind: ConfigKind, key: &str) -> Result<String, ConfigError> {
        let documents = self.documents.read().await;
        documents
            .get(&(kind, key.to_string()))
            .cloned()
            .ok_or_else(|| ConfigError::NotFound {
                kind,
                key: key.to_string(),
            })
    }

    async fn list(&self, kind: ConfigKind) -> Result<Vec<String>, ConfigError> {
        let documents = self.documents.read().await;
        let mut keys: Vec<String> = documents
            .keys()
            .filter(|(k, _)| *k == kind)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
