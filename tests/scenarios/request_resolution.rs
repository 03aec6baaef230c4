//! Test: Request Resolution - business, pipeline key and setup errors

use crate::helpers::*;
use bizops::actions::ActionRegistry;
use bizops::core::{ErrorCode, ResourceContext, StepStatus};
use bizops::services::{FormEventRequest, TriggerRequest};
use bizops::store::InMemoryConfigSource;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const ACME: &str = r#"
id: acme
displayName: Acme Catering
pipelines:
  defaultForm: quote_request
  triggers:
    deposit_paid: confirm_booking
    manual_review: manual
"#;

fn harness(log: &CallLog) -> Harness {
    let mut registry = ActionRegistry::new();
    registry
        .register(ScriptedAction::ok("quote_step", log))
        .register(ScriptedAction::ok("confirm_step", log))
        .register(ScriptedAction::ok("manual_step", log));

    Harness::new(
        InMemoryConfigSource::new()
            .with_business("acme", ACME)
            .with_business("bare", "id: bare\npipelines:\n  defaultForm: \"\"\n")
            .with_pipeline("quote_request", &pipeline_yaml("quote_request", &[("quote_step", false)]))
            .with_pipeline("confirm_booking", &pipeline_yaml("confirm_booking", &[("confirm_step", false)]))
            .with_pipeline("manual", &pipeline_yaml("manual", &[("manual_step", false)])),
        registry,
    )
}

/// Unknown trigger key fails before any action runs
#[tokio::test]
async fn test_unknown_trigger_key() {
    let log = call_log();
    let harness = harness(&log);

    let err = harness
        .triggers()
        .run(TriggerRequest::new("acme", "lead_created"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidInput);
    assert!(err.to_string().contains("trigger key 'lead_created' not found"));
    assert!(calls(&log).is_empty());
    assert!(harness.jobs.is_empty().await);
}

/// No pipeline key and no default form fails before loading any pipeline
#[tokio::test]
async fn test_form_without_pipeline_or_default() {
    let log = call_log();
    let source = Arc::new(CountingSource::new(
        InMemoryConfigSource::new().with_business("bare", "pipelines:\n  defaultForm: \"\"\n"),
    ));
    let mut harness = harness(&log);
    harness.config = Arc::new(bizops::store::ConfigStore::new(source.clone()));

    let err = harness
        .forms()
        .run(FormEventRequest::new("bare"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidInput);
    assert!(err.to_string().contains("pipeline key not specified"));
    // Only the business document was read
    assert_eq!(source.reads(), 1);
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_form_uses_default_pipeline() {
    let log = call_log();
    let harness = harness(&log);

    let result = harness
        .forms()
        .run(FormEventRequest::new("acme"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.pipeline_key, "quote_request");
    assert_eq!(result.business_id, "acme");
    assert_eq!(calls(&log), vec!["quote_step"]);
}

#[tokio::test]
async fn test_form_explicit_pipeline_overrides_default() {
    let log = call_log();
    let harness = harness(&log);

    let mut request = FormEventRequest::new("acme");
    request.pipeline_key = "manual".to_string();
    let result = harness.forms().run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.pipeline_key, "manual");
    assert_eq!(calls(&log), vec!["manual_step"]);
}

#[tokio::test]
async fn test_trigger_resolves_through_map_and_keeps_resource() {
    let log = call_log();
    let harness = harness(&log);

    let mut request = TriggerRequest::new("acme", "deposit_paid");
    request.resource = Some(ResourceContext {
        kind: "crm_item".to_string(),
        board_id: Some(123),
        item_id: Some(456),
        ..Default::default()
    });
    request.payload = fields(serde_json::json!({ "amount": 250 }));
    request.dry_run = true;

    let result = harness.triggers().run(request, &CancellationToken::new()).await.unwrap();

    assert!(result.success);
    assert!(result.dry_run);
    assert_eq!(result.pipeline_key, "confirm_booking");
    assert_steps(&result, &[("confirm_step", StepStatus::Ok)]);

    let job = harness.job(&result.job_id).await;
    assert_eq!(job.input.get("amount"), Some(&serde_json::json!(250)));
}

#[tokio::test]
async fn test_trigger_explicit_pipeline_wins() {
    let log = call_log();
    let harness = harness(&log);

    let mut request = TriggerRequest::new("acme", "deposit_paid");
    request.pipeline_key = "manual".to_string();
    let result = harness.triggers().run(request, &CancellationToken::new()).await.unwrap();

    assert_eq!(result.pipeline_key, "manual");
    assert_eq!(calls(&log), vec!["manual_step"]);
}

#[tokio::test]
async fn test_trigger_without_any_key() {
    let log = call_log();
    let harness = harness(&log);

    let err = harness
        .triggers()
        .run(TriggerRequest::new("acme", ""), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidInput);
    assert_eq!(err.message, "pipeline key not specified and trigger key not found");
}

#[tokio::test]
async fn test_unknown_business_and_pipeline() {
    let log = call_log();
    let harness = harness(&log);

    let err = harness
        .forms()
        .run(FormEventRequest::new("nobody"), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::BusinessNotFound);

    let mut request = FormEventRequest::new("acme");
    request.pipeline_key = "does_not_exist".to_string();
    let err = harness.forms().run(request, &CancellationToken::new()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::PipelineNotFound);
    assert!(err.to_string().contains("failed to load pipeline"));
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_malformed_pipeline_is_config_invalid() {
    let log = call_log();
    let harness = Harness::new(
        InMemoryConfigSource::new()
            .with_business("acme", "id: acme\n")
            .with_pipeline("nameless", "actions:\n  - critical: true\n"),
        ActionRegistry::new(),
    );

    let mut request = FormEventRequest::new("acme");
    request.pipeline_key = "nameless".to_string();
    let err = harness.forms().run(request, &CancellationToken::new()).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::ConfigInvalid);
    assert!(err.to_string().contains("has no name"));
    assert!(calls(&log).is_empty());
}

#[tokio::test]
async fn test_cancelled_setup() {
    let log = call_log();
    let harness = harness(&log);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = harness
        .forms()
        .run(FormEventRequest::new("acme"), &cancel)
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Cancelled);
    assert!(calls(&log).is_empty());
}
