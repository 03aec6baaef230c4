//! Declarative configuration documents from YAML

use crate::core::{BusinessConfig, PipelineDefinition};
use std::path::Path;
use thiserror::Error;

/// Error produced while turning a YAML document into a model
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0}")]
    Invalid(String),

    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse an optional document: empty or null YAML yields the default value
fn parse_or_default<T>(yaml: &str) -> Result<T, DocumentError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if yaml.trim().is_empty() {
        return Ok(T::default());
    }
    let parsed: Option<T> = serde_yaml::from_str(yaml)?;
    Ok(parsed.unwrap_or_default())
}

impl BusinessConfig {
    /// Load business configuration from a YAML file, keyed by its file stem
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let key = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        Self::from_yaml(&content, key)
    }

    /// Parse business configuration; an empty `id` is replaced by `lookup_key`
    pub fn from_yaml(yaml: &str, lookup_key: &str) -> Result<Self, DocumentError> {
        let mut business: BusinessConfig = parse_or_default(yaml)?;
        if business.id.is_empty() {
            business.id = lookup_key.to_string();
        }
        Ok(business)
    }
}

impl PipelineDefinition {
    /// Load a pipeline definition from a YAML file, keyed by its file stem
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let key = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        Self::from_yaml(&content, key)
    }

    /// Parse a pipeline definition; an empty `key` is replaced by `lookup_key`
    pub fn from_yaml(yaml: &str, lookup_key: &str) -> Result<Self, DocumentError> {
        let mut pipeline: PipelineDefinition = parse_or_default(yaml)?;
        if pipeline.key.is_empty() {
            pipeline.key = lookup_key.to_string();
        }
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Validate the pipeline definition
    pub fn validate(&self) -> Result<(), DocumentError> {
        for (index, action) in self.actions.iter().enumerate() {
            if action.name.trim().is_empty() {
                return Err(DocumentError::Invalid(format!(
                    "action at position {} in pipeline '{}' has no name",
                    index + 1,
                    self.key
                )));
            }
        }
        Ok(())
    }
}
