//! Test: Fault Isolation - non-critical failures never abort a run

use crate::helpers::*;
use bizops::actions::ActionRegistry;
use bizops::core::{JobStatus, PipelineContext, PipelineDefinition, StepStatus};
use bizops::execution::PipelineRunner;
use bizops::store::InMemoryConfigSource;
use bizops::services::FormEventRequest;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builtin actions only: normalize then notify
#[tokio::test]
async fn test_builtin_pipeline_succeeds_with_skipped_notification() {
    let yaml = pipeline_yaml(
        "quote_request",
        &[("normalize_input", false), ("send_slack_notification", false)],
    );
    let pipeline = PipelineDefinition::from_yaml(&yaml, "quote_request").unwrap();
    let runner = PipelineRunner::new(Arc::new(ActionRegistry::with_builtins()));

    let mut ctx = PipelineContext {
        business_id: "acme".to_string(),
        pipeline_key: "quote_request".to_string(),
        request_id: "req-a".to_string(),
        fields: fields(serde_json::json!({ "email": " Jane@Example.com " })),
        ..Default::default()
    };
    let (result, job) = runner.run(&pipeline, &mut ctx, &CancellationToken::new()).await;

    assert!(result.success);
    assert!(result.error.is_none());
    assert_steps(
        &result,
        &[
            ("normalize_input", StepStatus::Ok),
            ("send_slack_notification", StepStatus::Skipped),
        ],
    );
    assert_job_matches(&job, &result, JobStatus::Completed);
}

/// A failing middle action does not stop the ones after it
#[tokio::test]
async fn test_failing_middle_action_does_not_stop_pipeline() {
    let log = call_log();
    let mut registry = ActionRegistry::new();
    registry
        .register(ScriptedAction::ok("first", &log))
        .register(ScriptedAction::failing("middle", "upstream timeout", &log))
        .register(ScriptedAction::ok("last", &log));

    let harness = Harness::new(
        InMemoryConfigSource::new()
            .with_business("acme", "pipelines:\n  defaultForm: intake\n")
            .with_pipeline(
                "intake",
                &pipeline_yaml("intake", &[("first", false), ("middle", false), ("last", false)]),
            ),
        registry,
    );

    let result = harness
        .forms()
        .run(FormEventRequest::new("acme"), &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.steps.len(), 3);
    assert_steps(
        &result,
        &[
            ("first", StepStatus::Ok),
            ("middle", StepStatus::Failed),
            ("last", StepStatus::Ok),
        ],
    );
    assert_eq!(result.steps[1].error.as_deref(), Some("upstream timeout"));
    assert_eq!(result.non_critical_failures().count(), 1);
    assert_eq!(calls(&log), vec!["first", "middle", "last"]);

    let job = harness.job(&result.job_id).await;
    assert_job_matches(&job, &result, JobStatus::Completed);
    assert_eq!(job.result.get("stepsFailed"), Some(&serde_json::json!(1)));
}

/// Missing non-critical actions are recorded and skipped over
#[tokio::test]
async fn test_missing_non_critical_action_continues() {
    let log = call_log();
    let mut registry = ActionRegistry::new();
    registry.register(ScriptedAction::ok("after", &log));
    let runner = PipelineRunner::new(Arc::new(registry));

    let pipeline = PipelineDefinition::from_yaml(
        &pipeline_yaml("p", &[("not_there", false), ("after", false)]),
        "p",
    )
    .unwrap();
    let (result, job) = runner
        .run(&pipeline, &mut PipelineContext::default(), &CancellationToken::new())
        .await;

    assert!(result.success);
    assert_steps(&result, &[("not_there", StepStatus::Failed), ("after", StepStatus::Ok)]);
    assert!(result.steps[0].error.as_deref().unwrap().contains("not found"));
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(calls(&log), vec!["after"]);
}

/// Every action failing non-critically still yields success
#[tokio::test]
async fn test_all_non_critical_failures_still_succeed() {
    let log = call_log();
    let mut registry = ActionRegistry::new();
    registry
        .register(ScriptedAction::failing("a", "a broke", &log))
        .register(ScriptedAction::failing_silently("b", &log));
    let runner = PipelineRunner::new(Arc::new(registry));

    let pipeline =
        PipelineDefinition::from_yaml(&pipeline_yaml("p", &[("a", false), ("b", false)]), "p").unwrap();
    let (result, job) = runner
        .run(&pipeline, &mut PipelineContext::default(), &CancellationToken::new())
        .await;

    assert!(result.success);
    assert_eq!(result.steps.len(), 2);
    assert!(result.steps.iter().all(|s| s.status == StepStatus::Failed && !s.critical));
    assert_eq!(job.status, JobStatus::Completed);
}
