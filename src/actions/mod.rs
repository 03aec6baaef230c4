//! Pipeline actions and the registry that resolves them by name

pub mod builtin;

pub use builtin::{NormalizeInputAction, SendSlackNotificationAction};

use crate::core::{Fields, JobStep, PipelineContext};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// A named unit of work producing exactly one step outcome
///
/// Implementations never fail the pipeline directly: every failure is
/// reported as a `failed` [`JobStep`] with an error message. Honoring
/// `ctx.dry_run` and `cancel` is the action's own responsibility. Changes an
/// action makes to the context are visible to the actions after it.
#[async_trait]
pub trait Action: Send + Sync {
    /// Registry name of the action
    fn name(&self) -> &str;

    /// Execute against the run context with the action's configuration bag
    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        config: &Fields,
        cancel: &CancellationToken,
    ) -> JobStep;
}

/// Fixed mapping from action name to implementation
///
/// Built once at startup, then shared read-only behind an `Arc`.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in actions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register(NormalizeInputAction)
            .register(SendSlackNotificationAction);
        registry
    }

    /// Register an action under its own name, replacing any earlier entry
    pub fn register<A: Action + 'static>(&mut self, action: A) -> &mut Self {
        self.register_arc(Arc::new(action))
    }

    /// Register a shared action instance
    pub fn register_arc(&mut self, action: Arc<dyn Action>) -> &mut Self {
        let name = action.name().to_string();
        if self.actions.insert(name.clone(), action).is_some() {
            warn!("Action '{}' registered twice; keeping the latest", name);
        }
        self
    }

    /// Look up an action by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Action>> {
        self.actions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}
