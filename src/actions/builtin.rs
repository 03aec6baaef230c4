//! Built-in actions

use crate::actions::Action;
use crate::core::{Fields, JobStep, PipelineContext};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cleans up the event payload in place
///
/// String values are trimmed, empty strings are dropped, and the fields named
/// in the `lowercase` config list (default `["email"]`) are lower-cased.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizeInputAction;

impl NormalizeInputAction {
    pub const NAME: &'static str = "normalize_input";

    fn lowercase_fields(config: &Fields) -> Vec<String> {
        match config.get("lowercase").and_then(Value::as_array) {
            Some(list) => list
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            None => vec!["email".to_string()],
        }
    }
}

#[async_trait]
impl Action for NormalizeInputAction {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        config: &Fields,
        cancel: &CancellationToken,
    ) -> JobStep {
        if cancel.is_cancelled() {
            return JobStep::failed(Self::NAME, "cancelled before normalization");
        }

        let lowercase = Self::lowercase_fields(config);
        let mut normalized = Fields::new();
        let mut dropped = Vec::new();

        for (key, value) in std::mem::take(&mut ctx.fields) {
            match value {
                Value::String(s) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        dropped.push(Value::String(key));
                        continue;
                    }
                    let cleaned = if lowercase.iter().any(|f| f == &key) {
                        trimmed.to_lowercase()
                    } else {
                        trimmed.to_string()
                    };
                    normalized.insert(key, Value::String(cleaned));
                }
                other => {
                    normalized.insert(key, other);
                }
            }
        }

        debug!(
            "Normalized {} field(s), dropped {}",
            normalized.len(),
            dropped.len()
        );
        ctx.fields = normalized.clone();

        let mut step = JobStep::ok(Self::NAME)
            .with_detail("message", "input normalized")
            .with_detail("fields", Value::Object(normalized));
        if !dropped.is_empty() {
            step = step.with_detail("dropped", Value::Array(dropped));
        }
        step
    }
}

/// Posts a notification about the event
///
/// No notification transport is wired into the engine, so the step is always
/// reported as `skipped`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SendSlackNotificationAction;

impl SendSlackNotificationAction {
    pub const NAME: &'static str = "send_slack_notification";
}

#[async_trait]
impl Action for SendSlackNotificationAction {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        config: &Fields,
        _cancel: &CancellationToken,
    ) -> JobStep {
        let reason = if ctx.dry_run {
            "dry run: notification suppressed"
        } else {
            "no notification transport configured"
        };

        let mut step = JobStep::skipped(Self::NAME).with_detail("message", reason);
        if let Some(channel) = config.get("channel").and_then(Value::as_str) {
            step = step.with_detail("channel", channel);
        }
        step
    }
}
