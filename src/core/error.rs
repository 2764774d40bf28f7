//! Engine error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pipeline engine and the publish registry
#[derive(Debug, Error)]
pub enum EngineError {
    /// A target path or persisted file does not exist
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The caller may not publish to this repository
    #[error("Permission denied for repository '{repo}': {message}")]
    PermissionDenied { repo: String, message: String },

    /// A single attempt of a step or component action failed
    #[error("{unit} failed: {message}")]
    TransientExecution { unit: String, message: String },

    /// Retries exhausted or a non-retryable failure; aborts the run
    #[error("{unit} failed after {attempts} attempt(s) ({completed}/{total} completed): {message}")]
    FatalExecution {
        unit: String,
        attempts: usize,
        message: String,
        completed: usize,
        total: usize,
    },

    /// Malformed persisted file
    #[error("Failed to parse {what}: {message}")]
    Serialization { what: String, message: String },

    /// The content hash of a target could not be computed
    #[error("Cannot hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Manifest directive could not be parsed
    #[error("Manifest line {line}: {message}")]
    Manifest { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether this error means "nothing there yet" rather than a real failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound { .. })
    }

    /// Promote an error from a failing unit into a run-aborting one
    pub fn fatal(unit: &str, attempts: usize, message: impl Into<String>, completed: usize, total: usize) -> Self {
        EngineError::FatalExecution {
            unit: unit.to_string(),
            attempts,
            message: message.into(),
            completed,
            total,
        }
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(err: serde_yaml::Error) -> Self {
        EngineError::Serialization {
            what: "YAML document".to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
