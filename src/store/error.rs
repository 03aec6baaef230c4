//! Configuration store errors

use crate::core::config::DocumentError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which configuration namespace a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Business,
    Pipeline,
}

impl ConfigKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKind::Business => "business",
            ConfigKind::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{kind} config '{key}' not found")]
    NotFound { kind: ConfigKind, key: String },

    #[error("invalid {kind} key '{key}'")]
    InvalidKey { kind: ConfigKind, key: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {kind} config '{key}': {source}")]
    Parse {
        kind: ConfigKind,
        key: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid {kind} config '{key}': {reason}")]
    Invalid {
        kind: ConfigKind,
        key: String,
        reason: String,
    },

    #[error("configuration load cancelled")]
    Cancelled,
}

impl ConfigError {
    /// Wrap a document error with the namespace and key it was loaded for
    pub(crate) fn from_document(kind: ConfigKind, key: &str, err: DocumentError) -> Self {
        match err {
            DocumentError::Parse(source) => ConfigError::Parse {
                kind,
                key: key.to_string(),
                source,
            },
            DocumentError::Invalid(reason) => ConfigError::Invalid {
                kind,
                key: key.to_string(),
                reason,
            },
            DocumentError::Io(source) => ConfigError::Read {
                path: PathBuf::from(key),
                source,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ConfigError::NotFound { .. })
    }
}
