//! bizops - multi-tenant, configuration-driven pipeline engine
//!
//! Inbound form events and triggers are resolved to a business and a named
//! pipeline, the pipeline's actions run in order against a shared context, and
//! the outcome is recorded as a job.

pub mod actions;
pub mod cli;
pub mod core;
pub mod diagnostics;
pub mod execution;
pub mod persistence;
pub mod services;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use actions::{Action, ActionRegistry};
pub use core::{
    ActionDefinition, BusinessConfig, DomainError, ErrorCode, Fields, Job, JobStatus, JobStep,
    PipelineContext, PipelineDefinition, PipelineResult, ResourceContext, StepStatus,
};
pub use diagnostics::{ErrorReporter, TracingErrorReporter};
pub use execution::{PipelineRunner, RunEvent};
pub use persistence::{InMemoryJobStore, JobStore};
pub use services::{FormEventRequest, FormEventsService, TriggerRequest, TriggersService};
pub use store::{ConfigError, ConfigKind, ConfigSource, ConfigStore, FileConfigSource, InMemoryConfigSource};
