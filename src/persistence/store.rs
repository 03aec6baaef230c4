//! SQLite-based job store

use crate::core::{Job, JobStatus};
use crate::persistence::JobStore;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

const JOB_COLUMNS: &str =
    "id, business_id, pipeline_key, status, steps, input, result, created_at, updated_at";

/// SQLite job store
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    /// Open (or create) a job database; `":memory:"` opens a private in-memory database
    pub async fn new(db_path: &str) -> Result<Self> {
        let (options, max_connections) = if db_path == ":memory:" {
            // Every in-memory connection is its own database, so keep exactly one
            (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
        } else {
            (
                SqliteConnectOptions::new()
                    .filename(db_path)
                    .create_if_missing(true),
                5,
            )
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("bizops");
        std::fs::create_dir_all(&db_dir)
            .with_context(|| format!("Failed to create {}", db_dir.display()))?;

        Self::open(db_dir.join("jobs.db")).await
    }

    /// Open a database at a filesystem path
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db_path = path
            .to_str()
            .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {}", path.display()))?;
        Self::new(db_path).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                business_id TEXT NOT NULL,
                pipeline_key TEXT NOT NULL,
                status TEXT NOT NULL,
                steps TEXT NOT NULL,
                input TEXT NOT NULL,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_jobs_business_created ON jobs(business_id, created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn job_from_row(row: &SqliteRow) -> Result<Job> {
        let id: String = row.get("id");
        let status: String = row.get("status");

        Ok(Job {
            status: JobStatus::parse(&status)
                .ok_or_else(|| anyhow!("Unknown status '{}' for job {}", status, id))?,
            business_id: row.get("business_id"),
            pipeline_key: row.get("pipeline_key"),
            steps: serde_json::from_str(row.get::<&str, _>("steps"))
                .with_context(|| format!("Corrupt steps for job {}", id))?,
            input: serde_json::from_str(row.get::<&str, _>("input"))
                .with_context(|| format!("Corrupt input for job {}", id))?,
            result: serde_json::from_str(row.get::<&str, _>("result"))
                .with_context(|| format!("Corrupt result for job {}", id))?,
            created_at: Self::from_naive(row.get("created_at")),
            updated_at: Self::from_naive(row.get("updated_at")),
            id,
        })
    }
}

#[async_trait::async_trait]
impl JobStore for SqliteJobStore {
    async fn save(&self, job: &Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO jobs
            (id, business_id, pipeline_key, status, steps, input, result, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&job.id)
        .bind(&job.business_id)
        .bind(&job.pipeline_key)
        .bind(job.status.as_str())
        .bind(serde_json::to_string(&job.steps)?)
        .bind(serde_json::to_string(&job.input)?)
        .bind(serde_json::to_string(&job.result)?)
        .bind(Self::to_naive(job.created_at))
        .bind(Self::to_naive(job.updated_at))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to save job {}", job.id))?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Job>> {
        let row = sqlx::query(&format!("SELECT {} FROM jobs WHERE id = ?1", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load job")?;

        row.as_ref().map(Self::job_from_row).transpose()
    }

    async fn get_by_business_id(&self, business_id: &str, limit: usize) -> Result<Vec<Job>> {
        // SQLite treats a negative LIMIT as unlimited
        let limit = if limit == 0 { -1 } else { limit as i64 };

        let rows = sqlx::query(&format!(
            "SELECT {} FROM jobs WHERE business_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
            JOB_COLUMNS
        ))
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list jobs")?;

        rows.iter().map(Self::job_from_row).collect()
    }
}
