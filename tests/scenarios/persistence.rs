//! Test: Persistence - best-effort job saves

use crate::helpers::*;
use bizops::actions::ActionRegistry;
use bizops::core::{JobStatus, StepStatus};
use bizops::execution::PipelineRunner;
use bizops::persistence::JobStore;
use bizops::services::{FormEventRequest, FormEventsService, TriggerRequest, TriggersService};
use bizops::store::{ConfigStore, InMemoryConfigSource};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn source() -> InMemoryConfigSource {
    InMemoryConfigSource::new()
        .with_business(
            "acme",
            "pipelines:\n  defaultForm: intake\n  triggers:\n    lead_created: intake\n",
        )
        .with_pipeline("intake", &pipeline_yaml("intake", &[("step", false)]))
}

fn registry(log: &CallLog) -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(ScriptedAction::ok("step", log));
    registry
}

/// A failing job store never turns a successful run into an error
#[tokio::test]
async fn test_save_failure_is_reported_not_returned() {
    let log = call_log();
    let reporter = Arc::new(RecordingReporter::default());
    let config = Arc::new(ConfigStore::new(Arc::new(source())));
    let runner = Arc::new(PipelineRunner::new(Arc::new(registry(&log))));

    let forms = FormEventsService::new(
        Arc::clone(&config),
        Arc::clone(&runner),
        Arc::new(FailingJobStore),
        reporter.clone(),
    );
    let triggers = TriggersService::new(config, runner, Arc::new(FailingJobStore), reporter.clone());

    let mut request = FormEventRequest::new("acme");
    request.request_id = "req-form".to_string();
    let result = forms.run(request, &CancellationToken::new()).await.unwrap();
    assert!(result.success);
    assert_steps(&result, &[("step", StepStatus::Ok)]);

    let mut request = TriggerRequest::new("acme", "lead_created");
    request.request_id = "req-trigger".to_string();
    let result = triggers.run(request, &CancellationToken::new()).await.unwrap();
    assert!(result.success);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 2);
    assert!(reports[0].contains("req-form"));
    assert!(reports[0].contains("database is locked"));
    assert!(reports[1].contains("req-trigger"));
}

/// Saved jobs carry source-specific context and are queryable by business
#[tokio::test]
async fn test_jobs_saved_per_request() {
    let log = call_log();
    let harness = Harness::new(source(), registry(&log));

    let mut first = FormEventRequest::new("acme");
    first.request_id = "job-1".to_string();
    harness.forms().run(first, &CancellationToken::new()).await.unwrap();

    let mut second = TriggerRequest::new("acme", "lead_created");
    second.request_id = "job-2".to_string();
    harness.triggers().run(second, &CancellationToken::new()).await.unwrap();

    let jobs = harness.jobs.get_by_business_id("acme", 0).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|j| j.status == JobStatus::Completed));
    assert!(jobs[0].created_at >= jobs[1].created_at);
    assert!(jobs[0].updated_at >= jobs[0].created_at);

    assert!(harness.jobs.get_by_business_id("other", 0).await.unwrap().is_empty());
    assert!(harness.reporter.reports().is_empty());
}

/// Concurrent requests each produce their own job
#[tokio::test]
async fn test_concurrent_requests_do_not_interfere() {
    let log = call_log();
    let harness = Arc::new(Harness::new(source(), registry(&log)));

    let mut handles = Vec::new();
    for i in 0..16 {
        let harness = Arc::clone(&harness);
        handles.push(tokio::spawn(async move {
            let mut request = FormEventRequest::new("acme");
            request.request_id = format!("req-{}", i);
            harness.forms().run(request, &CancellationToken::new()).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().success);
    }

    assert_eq!(harness.jobs.len().await, 16);
    assert_eq!(calls(&log).len(), 16);
    for i in 0..16 {
        let job = harness.job(&format!("req-{}", i)).await;
        assert_eq!(job.steps.len(), 1);
    }
}
