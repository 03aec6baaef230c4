//! Cross-document configuration checks

use crate::{
    actions::ActionRegistry,
    store::{ConfigError, ConfigKind, ConfigStore},
};
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// One problem found in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// What the problem belongs to, e.g. `business 'acme'`
    pub subject: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Check every business and pipeline the store can see
///
/// Businesses must parse and every pipeline they reference (default form and
/// trigger targets) must load. Pipelines must parse and only use registered
/// actions. Only enumeration failures and cancellation are errors; everything
/// else is reported as an issue.
pub async fn check_config(
    store: &ConfigStore,
    registry: &ActionRegistry,
    cancel: &CancellationToken,
) -> Result<Vec<ValidationIssue>, ConfigError> {
    let mut issues = Vec::new();

    for id in store.list_keys(ConfigKind::Business).await? {
        let subject = format!("business '{}'", id);
        let business = match store.load_business(&id, cancel).await {
            Ok(business) => business,
            Err(ConfigError::Cancelled) => return Err(ConfigError::Cancelled),
            Err(e) => {
                issues.push(ValidationIssue::new(subject, e.to_string()));
                continue;
            }
        };

        if let Some(key) = business.default_form_pipeline() {
            if let Some(problem) = check_pipeline_ref(store, key, cancel).await? {
                issues.push(ValidationIssue::new(
                    subject.clone(),
                    format!("default form pipeline: {}", problem),
                ));
            }
        }

        let mut triggers: Vec<(&String, &String)> = business.pipelines.triggers.iter().collect();
        triggers.sort();
        for (trigger, key) in triggers {
            let problem = if key.is_empty() {
                Some("maps to no pipeline".to_string())
            } else {
                check_pipeline_ref(store, key, cancel).await?
            };
            if let Some(problem) = problem {
                issues.push(ValidationIssue::new(
                    subject.clone(),
                    format!("trigger '{}': {}", trigger, problem),
                ));
            }
        }
    }

    for key in store.list_keys(ConfigKind::Pipeline).await? {
        let subject = format!("pipeline '{}'", key);
        let pipeline = match store.load_pipeline(&key, cancel).await {
            Ok(pipeline) => pipeline,
            Err(ConfigError::Cancelled) => return Err(ConfigError::Cancelled),
            Err(e) => {
                issues.push(ValidationIssue::new(subject, e.to_string()));
                continue;
            }
        };

        for action in &pipeline.actions {
            if !registry.contains(&action.name) {
                issues.push(ValidationIssue::new(
                    subject.clone(),
                    format!("action '{}' is not registered", action.name),
                ));
            }
        }
    }

    Ok(issues)
}

async fn check_pipeline_ref(
    store: &ConfigStore,
    key: &str,
    cancel: &CancellationToken,
) -> Result<Option<String>, ConfigError> {
    match store.load_pipeline(key, cancel).await {
        Ok(_) => Ok(None),
        Err(ConfigError::Cancelled) => Err(ConfigError::Cancelled),
        Err(e) => Ok(Some(e.to_string())),
    }
}
