//! Test: Critical Failure - short-circuit on critical steps

use crate::helpers::*;
use bizops::actions::ActionRegistry;
use bizops::core::{JobStatus, PipelineContext, PipelineDefinition, StepStatus};
use bizops::execution::PipelineRunner;
use bizops::services::FormEventRequest;
use bizops::store::InMemoryConfigSource;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn context() -> PipelineContext {
    PipelineContext {
        business_id: "acme".to_string(),
        request_id: "req-b".to_string(),
        ..Default::default()
    }
}

/// A critical action missing from the registry fails the run
#[tokio::test]
async fn test_missing_critical_action_fails_run() {
    let runner = PipelineRunner::new(Arc::new(ActionRegistry::new()));
    let pipeline = PipelineDefinition::from_yaml(
        &pipeline_yaml("p", &[("missing_action", true)]),
        "p",
    )
    .unwrap();

    let (result, job) = runner
        .run(&pipeline, &mut context(), &CancellationToken::new())
        .await;

    assert!(!result.success);
    assert_steps(&result, &[("missing_action", StepStatus::Failed)]);
    assert!(result.steps[0].critical);
    assert!(result.error.as_deref().unwrap().contains("not found"));
    assert_job_matches(&job, &result, JobStatus::Failed);
}

/// Steps after a failing critical action are never executed
#[tokio::test]
async fn test_critical_failure_short_circuits() {
    for failing_index in 0..4 {
        let log = call_log();
        let names = ["a", "b", "c", "d"];
        let mut registry = ActionRegistry::new();
        let mut actions = Vec::new();
        for (index, name) in names.iter().enumerate() {
            if index == failing_index {
                registry.register(ScriptedAction::failing(name, "boom", &log));
                actions.push((*name, true));
            } else {
                registry.register(ScriptedAction::ok(name, &log));
                actions.push((*name, false));
            }
        }
        let runner = PipelineRunner::new(Arc::new(registry));
        let pipeline = PipelineDefinition::from_yaml(&pipeline_yaml("p", &actions), "p").unwrap();

        let (result, job) = runner
            .run(&pipeline, &mut context(), &CancellationToken::new())
            .await;

        assert!(!result.success);
        assert_eq!(result.steps.len(), failing_index + 1);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(calls(&log), names[..=failing_index].to_vec());
        assert_eq!(job.status, JobStatus::Failed);
    }
}

/// Missing and failing critical actions have the same effect on the outcome
#[tokio::test]
async fn test_missing_and_failing_actions_are_equivalent() {
    for critical in [true, false] {
        let log = call_log();
        let mut registry = ActionRegistry::new();
        registry
            .register(ScriptedAction::failing("broken", "broken failed", &log))
            .register(ScriptedAction::ok("tail", &log));
        let runner = PipelineRunner::new(Arc::new(registry));

        let with_missing = PipelineDefinition::from_yaml(
            &pipeline_yaml("p", &[("ghost", critical), ("tail", false)]),
            "p",
        )
        .unwrap();
        let with_failing = PipelineDefinition::from_yaml(
            &pipeline_yaml("p", &[("broken", critical), ("tail", false)]),
            "p",
        )
        .unwrap();

        let (missing, missing_job) = runner
            .run(&with_missing, &mut context(), &CancellationToken::new())
            .await;
        let (failing, failing_job) = runner
            .run(&with_failing, &mut context(), &CancellationToken::new())
            .await;

        assert_eq!(missing.success, failing.success, "critical={}", critical);
        assert_eq!(missing.steps.len(), failing.steps.len(), "critical={}", critical);
        assert_eq!(missing_job.status, failing_job.status, "critical={}", critical);
        assert_eq!(missing.statuses(), failing.statuses(), "critical={}", critical);
    }
}

/// A critical step without its own error gets a generic message
#[tokio::test]
async fn test_critical_failure_without_message() {
    let log = call_log();
    let mut registry = ActionRegistry::new();
    registry.register(ScriptedAction::failing_silently("charge_card", &log));
    let runner = PipelineRunner::new(Arc::new(registry));
    let pipeline =
        PipelineDefinition::from_yaml(&pipeline_yaml("p", &[("charge_card", true)]), "p").unwrap();

    let (result, job) = runner
        .run(&pipeline, &mut context(), &CancellationToken::new())
        .await;

    assert_eq!(result.error.as_deref(), Some("critical action 'charge_card' failed"));
    assert_eq!(
        job.result.get("error"),
        Some(&serde_json::json!("critical action 'charge_card' failed"))
    );
}

/// A critical failure is still a result, not a request error, and is persisted
#[tokio::test]
async fn test_service_returns_failed_result_and_saves_job() {
    let log = call_log();
    let mut registry = ActionRegistry::new();
    registry
        .register(ScriptedAction::ok("validate", &log))
        .register(ScriptedAction::failing("create_invoice", "invoice API rejected request", &log))
        .register(ScriptedAction::ok("email_customer", &log));

    let harness = Harness::new(
        InMemoryConfigSource::new()
            .with_business("acme", "id: acme\n")
            .with_pipeline(
                "invoice",
                &pipeline_yaml(
                    "invoice",
                    &[("validate", true), ("create_invoice", true), ("email_customer", false)],
                ),
            ),
        registry,
    );

    let mut request = FormEventRequest::new("acme");
    request.pipeline_key = "invoice".to_string();
    request.request_id = "req-invoice".to_string();

    let result = harness
        .forms()
        .run(request, &CancellationToken::new())
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("invoice API rejected request"));
    assert_steps(
        &result,
        &[("validate", StepStatus::Ok), ("create_invoice", StepStatus::Failed)],
    );

    let job = harness.job("req-invoice").await;
    assert_job_matches(&job, &result, JobStatus::Failed);
    assert!(harness.reporter.reports().is_empty());
}
