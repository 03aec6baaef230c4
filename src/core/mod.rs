//! Core domain models
//!
//! Tenant configuration, pipeline definitions, the per-run context and the
//! job/result records produced by a run.

pub mod business;
pub mod config;
pub mod context;
pub mod error;
pub mod job;
pub mod pipeline;

pub use business::*;
pub use context::*;
pub use error::{DomainError, ErrorCode};
pub use job::*;
pub use pipeline::*;
