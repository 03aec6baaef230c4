//! Pipeline definition model

use serde::{Deserialize, Serialize};

/// Opaque key/value bag (event payloads, action configuration, step details)
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A named, ordered list of actions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineDefinition {
    /// Pipeline key (falls back to the lookup key when absent)
    pub key: String,

    /// Human description
    pub description: String,

    /// Actions, executed strictly in this order
    pub actions: Vec<ActionDefinition>,
}

/// One action entry within a pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionDefinition {
    /// Registry name of the action to run
    #[serde(default)]
    pub name: String,

    /// Whether a failure of this action aborts the pipeline
    #[serde(default)]
    pub critical: bool,

    /// Action-specific settings, interpreted only by the action
    #[serde(default)]
    pub config: Fields,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, critical: bool) -> Self {
        Self {
            name: name.into(),
            critical,
            config: Fields::new(),
        }
    }
}

impl PipelineDefinition {
    /// Number of actions in the pipeline
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Action names in execution order
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.name.as_str())
    }
}
