//! Pipeline runner - walks an action list and records what happened

use crate::{
    actions::ActionRegistry,
    core::{
        ActionDefinition, DomainError, Job, JobStatus, JobStep, PipelineContext, PipelineDefinition,
        PipelineResult, StepStatus,
    },
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Events emitted while a pipeline runs
#[derive(Debug, Clone)]
pub enum RunEvent {
    Started {
        job_id: String,
        business_id: String,
        pipeline_key: String,
        total_actions: usize,
    },
    StepFinished {
        job_id: String,
        index: usize,
        step: JobStep,
    },
    Finished {
        job_id: String,
        status: JobStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// Executes pipeline definitions against the action registry
///
/// Actions run strictly one after another in declared order. A failed step
/// from a critical action (or a critical action missing from the registry)
/// stops the run; any other failure is recorded and the run continues.
pub struct PipelineRunner {
    registry: Arc<ActionRegistry>,
    event_handlers: Vec<EventHandler>,
}

impl PipelineRunner {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self {
            registry,
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
        self
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    fn emit(&self, event: RunEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Run a pipeline, returning the caller-facing result and the job record
    pub async fn run(
        &self,
        pipeline: &PipelineDefinition,
        ctx: &mut PipelineContext,
        cancel: &CancellationToken,
    ) -> (PipelineResult, Job) {
        let mut job = Job::start(
            ctx.request_id.clone(),
            ctx.business_id.clone(),
            ctx.pipeline_key.clone(),
            ctx.fields.clone(),
        );
        let mut result = PipelineResult {
            success: false,
            pipeline_key: pipeline.key.clone(),
            business_id: ctx.business_id.clone(),
            dry_run: ctx.dry_run,
            steps: Vec::with_capacity(pipeline.len()),
            job_id: job.id.clone(),
            error: None,
        };

        info!(
            "Running pipeline '{}' for business '{}' (job {}, {} action(s){})",
            pipeline.key,
            ctx.business_id,
            job.id,
            pipeline.len(),
            if ctx.dry_run { ", dry run" } else { "" }
        );
        self.emit(RunEvent::Started {
            job_id: job.id.clone(),
            business_id: job.business_id.clone(),
            pipeline_key: pipeline.key.clone(),
            total_actions: pipeline.len(),
        });

        for (index, action_def) in pipeline.actions.iter().enumerate() {
            let (step, registered) = self.execute_action(action_def, ctx, cancel).await;

            job.steps.push(step.clone());
            result.steps.push(step.clone());
            self.emit(RunEvent::StepFinished {
                job_id: job.id.clone(),
                index,
                step: step.clone(),
            });

            if !step.is_failed() {
                continue;
            }

            if action_def.critical {
                let error = critical_error(&step, registered);
                error!(
                    "Critical action '{}' failed in pipeline '{}': {}",
                    action_def.name, pipeline.key, error
                );
                result.error = Some(error);
                self.finish(&mut job, &mut result, false);
                return (result, job);
            }

            warn!(
                "Action '{}' failed in pipeline '{}', continuing: {}",
                action_def.name,
                pipeline.key,
                step.error.as_deref().unwrap_or("no error message")
            );
        }

        self.finish(&mut job, &mut result, true);
        (result, job)
    }

    /// Run one action, or synthesize a failed step when it is not registered
    ///
    /// The flag is false when the registry had no action by that name.
    async fn execute_action(
        &self,
        action_def: &ActionDefinition,
        ctx: &mut PipelineContext,
        cancel: &CancellationToken,
    ) -> (JobStep, bool) {
        let (mut step, registered) = match self.registry.get(&action_def.name) {
            Some(action) => {
                debug!("Executing action: {}", action_def.name);
                (action.execute(ctx, &action_def.config, cancel).await, true)
            }
            None => {
                debug!("Action not registered: {}", action_def.name);
                let step = JobStep::failed(
                    action_def.name.clone(),
                    format!("action '{}' not found", action_def.name),
                )
                .with_detail("reason", "not_registered");
                (step, false)
            }
        };

        step.critical = action_def.critical;
        (step, registered)
    }

    fn finish(&self, job: &mut Job, result: &mut PipelineResult, success: bool) {
        result.success = success;
        job.status = if success {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };

        let counts = [
            ("stepsOk", job.count_steps(StepStatus::Ok)),
            ("stepsSkipped", job.count_steps(StepStatus::Skipped)),
            ("stepsFailed", job.count_steps(StepStatus::Failed)),
        ];
        job.result.insert("success".to_string(), Value::Bool(success));
        for (key, count) in counts {
            job.result.insert(key.to_string(), count.into());
        }
        if let Some(error) = &result.error {
            job.result.insert("error".to_string(), Value::String(error.clone()));
        }
        job.updated_at = Utc::now();

        info!(
            "Pipeline '{}' {} (job {}, {} step(s))",
            result.pipeline_key,
            job.status,
            job.id,
            job.steps.len()
        );
        self.emit(RunEvent::Finished {
            job_id: job.id.clone(),
            status: job.status,
        });
    }
}

/// Top-level error for a failed critical step
fn critical_error(step: &JobStep, registered: bool) -> String {
    if !registered {
        return DomainError::critical_failure(&step.name, Some("action not found")).message;
    }

    match step.error.as_deref().filter(|error| !error.is_empty()) {
        Some(error) => error.to_string(),
        None => DomainError::critical_failure(&step.name, None).message,
    }
}
