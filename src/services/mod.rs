//! Request services - resolve tenant and pipeline, run, persist
//!
//! Setup failures (tenant, pipeline key, pipeline definition) are returned as
//! [`DomainError`]s before any action runs. Once a run starts the caller always
//! gets a [`PipelineResult`]; saving the job is best effort and failures go to
//! the [`ErrorReporter`].

pub mod form_events;
pub mod triggers;

pub use form_events::{FormEventRequest, FormEventsService};
pub use triggers::{TriggerRequest, TriggersService};

use crate::{
    core::{BusinessConfig, DomainError, ErrorCode, Job, PipelineContext, PipelineDefinition, PipelineResult},
    diagnostics::ErrorReporter,
    execution::PipelineRunner,
    persistence::JobStore,
    store::{ConfigError, ConfigStore},
};
use anyhow::anyhow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Collaborators shared by both request services
#[derive(Clone)]
pub(crate) struct RequestPipeline {
    config: Arc<ConfigStore>,
    runner: Arc<PipelineRunner>,
    jobs: Arc<dyn JobStore>,
    reporter: Arc<dyn ErrorReporter>,
}

impl RequestPipeline {
    pub(crate) fn new(
        config: Arc<ConfigStore>,
        runner: Arc<PipelineRunner>,
        jobs: Arc<dyn JobStore>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            config,
            runner,
            jobs,
            reporter,
        }
    }

    /// Load the tenant configuration for a request
    pub(crate) async fn load_business(
        &self,
        business_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Arc<BusinessConfig>, DomainError> {
        if business_id.trim().is_empty() {
            return Err(DomainError::invalid_input("businessId is required"));
        }

        self.config
            .load_business(business_id, cancel)
            .await
            .map_err(|e| config_error("failed to load business", ErrorCode::BusinessNotFound, e))
    }

    /// Load the pipeline, run it, and persist the job
    pub(crate) async fn run(
        &self,
        pipeline_key: &str,
        mut ctx: PipelineContext,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, DomainError> {
        let pipeline: Arc<PipelineDefinition> = self
            .config
            .load_pipeline(pipeline_key, cancel)
            .await
            .map_err(|e| config_error("failed to load pipeline", ErrorCode::PipelineNotFound, e))?;

        ctx.pipeline_key = pipeline_key.to_string();
        if ctx.request_id.is_empty() {
            ctx.request_id = Uuid::new_v4().to_string();
        }

        let (result, job) = self.runner.run(&pipeline, &mut ctx, cancel).await;
        self.persist(&job, cancel).await;

        Ok(result)
    }

    async fn persist(&self, job: &Job, cancel: &CancellationToken) {
        let saved = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(anyhow!("job save cancelled")),
            saved = self.jobs.save(job) => saved,
        };

        match saved {
            Ok(()) => debug!("Saved job {}", job.id),
            Err(e) => self
                .reporter
                .report(&format!("failed to save job {}", job.id), &e),
        }
    }
}

/// Map a configuration load failure onto a domain error
fn config_error(message: &str, not_found: ErrorCode, err: ConfigError) -> DomainError {
    let code = match &err {
        ConfigError::NotFound { .. } => not_found,
        ConfigError::InvalidKey { .. } => ErrorCode::InvalidInput,
        ConfigError::Cancelled => return DomainError::new(ErrorCode::Cancelled, "request cancelled"),
        ConfigError::Read { .. } | ConfigError::Parse { .. } | ConfigError::Invalid { .. } => {
            ErrorCode::ConfigInvalid
        }
    };
    DomainError::new(code, message).with_source(err)
}
