//! Execution records: jobs, steps and the caller-facing result

use crate::core::pipeline::Fields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Reserved for callers that pre-create a job record; the runner never produces it
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Parse the stored representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "running" => Some(JobStatus::Running),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    Skipped,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Ok => "ok",
            StepStatus::Skipped => "skipped",
            StepStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one executed (or missing) action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStep {
    pub name: String,
    pub status: StepStatus,

    /// Copied from the action definition by the runner
    #[serde(default)]
    pub critical: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Action-produced details
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub details: Fields,
}

impl JobStep {
    fn new(name: impl Into<String>, status: StepStatus) -> Self {
        Self {
            name: name.into(),
            status,
            critical: false,
            error: None,
            details: Fields::new(),
        }
    }

    pub fn ok(name: impl Into<String>) -> Self {
        Self::new(name, StepStatus::Ok)
    }

    pub fn skipped(name: impl Into<String>) -> Self {
        Self::new(name, StepStatus::Skipped)
    }

    pub fn failed(name: impl Into<String>, error: impl Into<String>) -> Self {
        let mut step = Self::new(name, StepStatus::Failed);
        step.error = Some(error.into());
        step
    }

    /// Add a detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}

/// Durable record of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Equal to the request id
    pub id: String,
    pub business_id: String,
    pub pipeline_key: String,
    pub status: JobStatus,
    pub steps: Vec<JobStep>,

    /// Original input fields
    pub input: Fields,

    pub result: Fields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a job in the `running` state
    pub fn start(
        id: impl Into<String>,
        business_id: impl Into<String>,
        pipeline_key: impl Into<String>,
        input: Fields,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            business_id: business_id.into(),
            pipeline_key: pipeline_key.into(),
            status: JobStatus::Running,
            steps: Vec::new(),
            input,
            result: Fields::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of steps with the given status
    pub fn count_steps(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Caller-facing projection of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResult {
    pub success: bool,
    pub pipeline_key: String,
    pub business_id: String,
    pub dry_run: bool,
    pub steps: Vec<JobStep>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineResult {
    /// Steps that failed without aborting the run
    pub fn non_critical_failures(&self) -> impl Iterator<Item = &JobStep> {
        self.steps.iter().filter(|s| s.is_failed() && !s.critical)
    }

    /// Step statuses in execution order
    pub fn statuses(&self) -> Vec<StepStatus> {
        self.steps.iter().map(|s| s.status).collect()
    }
}
