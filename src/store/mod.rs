//! Configuration store - cached tenant and pipeline configuration
//!
//! Every request reads through the store; a cache miss reads the document
//! from the [`ConfigSource`], parses it with no lock held, and publishes the
//! result under a short write lock. The first writer for a key wins, so racing
//! loads may parse twice but always hand out the same cached value afterwards.
//! Entries live until explicitly invalidated. A load that started before an
//! invalidation returns what it read but never caches it.

pub mod error;
pub mod source;

pub use error::{ConfigError, ConfigKind};
pub use source::{ConfigSource, FileConfigSource, InMemoryConfigSource};

use crate::core::config::DocumentError;
use crate::core::{BusinessConfig, PipelineDefinition};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A cached value and the time it was loaded
#[derive(Debug)]
struct CacheEntry<T> {
    value: Arc<T>,
    loaded_at: DateTime<Utc>,
}

/// Cached entries plus a generation bumped by every invalidation
struct Cache<T> {
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
    generation: AtomicU64,
}

impl<T> Cache<T> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    async fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.remove(key).is_some()
    }

    async fn clear(&self) {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.clear();
    }

    async fn loaded_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries.read().await.get(key).map(|entry| entry.loaded_at)
    }
}

/// Read-through cache of business configs and pipeline definitions
pub struct ConfigStore {
    source: Arc<dyn ConfigSource>,
    businesses: Cache<BusinessConfig>,
    pipelines: Cache<PipelineDefinition>,
}

impl ConfigStore {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            businesses: Cache::new(),
            pipelines: Cache::new(),
        }
    }

    /// Load a business configuration by id
    pub async fn load_business(
        &self,
        business_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<BusinessConfig>, ConfigError> {
        self.load_cached(
            &self.businesses,
            ConfigKind::Business,
            business_id,
            cancel,
            BusinessConfig::from_yaml,
        )
        .await
    }

    /// Load a pipeline definition by key
    pub async fn load_pipeline(
        &self,
        pipeline_key: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<PipelineDefinition>, ConfigError> {
        self.load_cached(
            &self.pipelines,
            ConfigKind::Pipeline,
            pipeline_key,
            cancel,
            PipelineDefinition::from_yaml,
        )
        .await
    }

    /// Load every business the source knows about
    ///
    /// Documents that fail to load are skipped; only a failure to enumerate
    /// the source (or cancellation) is an error.
    pub async fn load_all_businesses(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<BusinessConfig>>, ConfigError> {
        let ids = self.source.list(ConfigKind::Business).await?;
        let mut businesses = Vec::with_capacity(ids.len());
        for id in ids {
            match self.load_business(&id, cancel).await {
                Ok(business) => businesses.push(business),
                Err(ConfigError::Cancelled) => return Err(ConfigError::Cancelled),
                Err(e) => warn!("Skipping business '{}': {}", id, e),
            }
        }
        Ok(businesses)
    }

    /// Load every pipeline the source knows about, skipping broken documents
    pub async fn load_all_pipelines(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Arc<PipelineDefinition>>, ConfigError> {
        let keys = self.source.list(ConfigKind::Pipeline).await?;
        let mut pipelines = Vec::with_capacity(keys.len());
        for key in keys {
            match self.load_pipeline(&key, cancel).await {
                Ok(pipeline) => pipelines.push(pipeline),
                Err(ConfigError::Cancelled) => return Err(ConfigError::Cancelled),
                Err(e) => warn!("Skipping pipeline '{}': {}", key, e),
            }
        }
        Ok(pipelines)
    }

    /// Keys the source knows about in a namespace, sorted
    pub async fn list_keys(&self, kind: ConfigKind) -> Result<Vec<String>, ConfigError> {
        self.source.list(kind).await
    }

    /// Drop a cached business so the next load re-reads the source
    pub async fn invalidate_business(&self, business_id: &str) -> bool {
        self.businesses.remove(business_id).await
    }

    /// Drop a cached pipeline so the next load re-reads the source
    pub async fn invalidate_pipeline(&self, pipeline_key: &str) -> bool {
        self.pipelines.remove(pipeline_key).await
    }

    /// Drop every cached entry
    pub async fn clear(&self) {
        self.businesses.clear().await;
        self.pipelines.clear().await;
    }

    /// When the cached business was loaded, if it is cached
    pub async fn business_loaded_at(&self, business_id: &str) -> Option<DateTime<Utc>> {
        self.businesses.loaded_at(business_id).await
    }

    /// When the cached pipeline was loaded, if it is cached
    pub async fn pipeline_loaded_at(&self, pipeline_key: &str) -> Option<DateTime<Utc>> {
        self.pipelines.loaded_at(pipeline_key).await
    }

    async fn load_cached<T>(
        &self,
        cache: &Cache<T>,
        kind: ConfigKind,
        key: &str,
        cancel: &CancellationToken,
        parse: fn(&str, &str) -> Result<T, DocumentError>,
    ) -> Result<Arc<T>, ConfigError> {
        let generation = {
            let cached = cache.entries.read().await;
            if let Some(entry) = cached.get(key) {
                return Ok(Arc::clone(&entry.value));
            }
            cache.generation.load(Ordering::SeqCst)
        };

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ConfigError::Cancelled),
            raw = self.source.read(kind, key) => raw?,
        };

        let parsed = parse(&raw, key).map_err(|e| ConfigError::from_document(kind, key, e))?;
        debug!("Loaded {} config '{}'", kind, key);

        let mut cached = cache.entries.write().await;
        if cache.generation.load(Ordering::SeqCst) != generation {
            debug!("{} config '{}' invalidated while loading, not caching", kind, key);
            return Ok(Arc::new(parsed));
        }
        let entry = cached.entry(key.to_string()).or_insert_with(|| CacheEntry {
            value: Arc::new(parsed),
            loaded_at: Utc::now(),
        });
        Ok(Arc::clone(&entry.value))
    }
}
