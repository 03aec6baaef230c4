//! Pipeline context - per-invocation input handed to every action

use crate::core::pipeline::Fields;
use serde::{Deserialize, Serialize};

/// Execution context for one pipeline run
///
/// Owned by a single run and never shared between concurrent runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineContext {
    /// Tenant the run belongs to
    pub business_id: String,

    /// Resolved pipeline key
    pub pipeline_key: String,

    /// Where the event came from, e.g. "form" or "trigger"
    pub source: String,

    /// Advisory flag asking actions to avoid real side effects
    pub dry_run: bool,

    /// Event payload
    pub fields: Fields,

    /// Caller-supplied options
    pub options: Fields,

    /// External resource that fired a trigger, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<ResourceContext>,

    /// Request identifier, reused as the job identifier
    pub request_id: String,
}

/// Describes the external resource (e.g. a CRM item) that fired a trigger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContext {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub data: Fields,
}

impl PipelineContext {
    /// Get a payload field
    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    /// Get a payload field as a string slice
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }

    /// Get an option as a bool (missing or non-boolean options are `false`)
    pub fn option_enabled(&self, key: &str) -> bool {
        self.options
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}
