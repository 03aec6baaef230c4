//! Trigger service

use crate::{
    core::{BusinessConfig, DomainError, Fields, PipelineContext, PipelineResult, ResourceContext},
    diagnostics::ErrorReporter,
    execution::PipelineRunner,
    persistence::JobStore,
    services::RequestPipeline,
    store::ConfigStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default source tag for triggers
pub const TRIGGER_SOURCE: &str = "trigger";

/// An event fired by an external system, e.g. a CRM item changing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerRequest {
    pub business_id: String,

    /// Looked up in the business's trigger map when no pipeline key is given
    pub trigger_key: String,

    /// Explicit pipeline; takes precedence over `trigger_key`
    pub pipeline_key: String,

    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceContext>,

    pub payload: Fields,
    pub dry_run: bool,
    pub request_id: String,
}

impl TriggerRequest {
    pub fn new(business_id: impl Into<String>, trigger_key: impl Into<String>) -> Self {
        Self {
            business_id: business_id.into(),
            trigger_key: trigger_key.into(),
            ..Default::default()
        }
    }
}

/// Runs pipelines for triggers
#[derive(Clone)]
pub struct TriggersService {
    inner: RequestPipeline,
}

impl TriggersService {
    pub fn new(
        config: Arc<ConfigStore>,
        runner: Arc<PipelineRunner>,
        jobs: Arc<dyn JobStore>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            inner: RequestPipeline::new(config, runner, jobs, reporter),
        }
    }

    /// Handle a trigger
    pub async fn run(
        &self,
        request: TriggerRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, DomainError> {
        let business = self.inner.load_business(&request.business_id, cancel).await?;
        let pipeline_key = resolve_pipeline_key(&business, &request)?;
        debug!(
            "Trigger '{}' for '{}' resolved to pipeline '{}'",
            request.trigger_key, request.business_id, pipeline_key
        );

        let source = if request.source.is_empty() {
            TRIGGER_SOURCE.to_string()
        } else {
            request.source
        };
        let ctx = PipelineContext {
            business_id: request.business_id,
            pipeline_key: pipeline_key.clone(),
            source,
            dry_run: request.dry_run,
            fields: request.payload,
            options: Fields::new(),
            resource: request.resource,
            request_id: request.request_id,
        };

        self.inner.run(&pipeline_key, ctx, cancel).await
    }
}

/// Explicit key first, then the trigger map
fn resolve_pipeline_key(
    business: &BusinessConfig,
    request: &TriggerRequest,
) -> Result<String, DomainError> {
    let mut pipeline_key = request.pipeline_key.clone();

    if pipeline_key.is_empty() && !request.trigger_key.is_empty() {
        pipeline_key = business
            .pipeline_for_trigger(&request.trigger_key)
            .ok_or_else(|| {
                DomainError::invalid_input(format!(
                    "trigger key '{}' not found in business config",
                    request.trigger_key
                ))
            })?
            .to_string();
    }

    if pipeline_key.is_empty() {
        return Err(DomainError::invalid_input(
            "pipeline key not specified and trigger key not found",
        ));
    }
    Ok(pipeline_key)
}
