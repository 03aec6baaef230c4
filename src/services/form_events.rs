//! Form event service

use crate::{
    core::{DomainError, Fields, PipelineContext, PipelineResult},
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

/// Default source tag for form submissions
pub const FORM_SOURCE: &str = "form";

/// A submitted form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormEventRequest {
    pub business_id: String,

    /// Explicit pipeline; empty means the business's default form pipeline
    pub pipeline_key: String,

    pub source: String,
    pub dry_run: bool,
    pub fields: Fields,
    pub options: Fields,

    /// Generated when empty
    pub request_id: String,
}

impl FormEventRequest {
    pub fn new(business_id: impl Into<String>) -> Self {
        Self {
            business_id: business_id.into(),
            ..Default::default()
        }
    }
}

/// Runs pipelines for form submissions
#[derive(Clone)]
pub struct FormEventsService {
    inner: RequestPipeline,
}

impl FormEventsService {
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

    /// Handle a form event
    pub async fn run(
        &self,
        request: FormEventRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult, DomainError> {
        let business = self.inner.load_business(&request.business_id, cancel).await?;

        let pipeline_key = if request.pipeline_key.is_empty() {
            business
                .default_form_pipeline()
                .map(str::to_string)
                .ok_or_else(|| {
                    DomainError::invalid_input(
                        "pipeline key not specified and no default form configured",
                    )
                })?
        } else {
            request.pipeline_key.clone()
        };
        debug!(
            "Form event for '{}' resolved to pipeline '{}'",
            request.business_id, pipeline_key
        );

        let source = if request.source.is_empty() {
            FORM_SOURCE.to_string()
        } else {
            request.source
        };
        let ctx = PipelineContext {
            business_id: request.business_id,
            pipeline_key: pipeline_key.clone(),
            source,
            dry_run: request.dry_run,
            fields: request.fields,
            options: request.options,
            resource: None,
            request_id: request.request_id,
        };

        self.inner.run(&pipeline_key, ctx, cancel).await
    }
}
