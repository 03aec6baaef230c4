//! Domain error type surfaced to callers of the request services

use std::fmt;
use thiserror::Error;

/// Boxed cause carried by a [`DomainError`]
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stable, machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    BusinessNotFound,
    PipelineNotFound,
    InvalidInput,
    ActionFailed,
    CriticalFailure,
    /// A configuration document exists but could not be read, parsed or validated
    ConfigInvalid,
    /// Request setup was aborted by cancellation
    Cancelled,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BusinessNotFound => "BUSINESS_NOT_FOUND",
            ErrorCode::PipelineNotFound => "PIPELINE_NOT_FOUND",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::ActionFailed => "ACTION_FAILED",
            ErrorCode::CriticalFailure => "CRITICAL_FAILURE",
            ErrorCode::ConfigInvalid => "CONFIG_INVALID",
            ErrorCode::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged domain error: a stable code, a human message and an optional cause
#[derive(Debug, Error)]
#[error("{code}: {message}{}", .source.as_ref().map(|e| format!(" ({})", e)).unwrap_or_default())]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        self.source = Some(source.into());
        self
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Error describing a critical action that aborted a run
    pub fn critical_failure(action: &str, reason: Option<&str>) -> Self {
        let message = match reason {
            Some(reason) => format!("critical action '{}' failed: {}", action, reason),
            None => format!("critical action '{}' failed", action),
        };
        Self::new(ErrorCode::CriticalFailure, message)
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }
}
