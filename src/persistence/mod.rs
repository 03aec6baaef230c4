//! Persistence layer for job records

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteJobStore;

use crate::core::Job;
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Trait for job storage backends
///
/// Saving a job replaces any record with the same id as a whole; readers see
/// either the old or the new record.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or replace a job
    async fn save(&self, job: &Job) -> Result<()>;

    /// Load a job by id
    async fn get_by_id(&self, id: &str) -> Result<Option<Job>>;

    /// Jobs for a business, newest first; `limit == 0` returns all of them
    async fn get_by_business_id(&self, business_id: &str, limit: usize) -> Result<Vec<Job>>;
}

/// In-memory job store (for testing or ephemeral use)
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored jobs
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl JobStore for InMemoryJobStore {
    async fn save(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(id).cloned())
    }

    async fn get_by_business_id(&self, business_id: &str, limit: usize) -> Result<Vec<Job>> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|job| job.business_id == business_id)
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        if limit > 0 {
            matching.truncate(limit);
        }
        Ok(matching)
    }
}
