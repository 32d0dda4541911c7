//! Error types for the botdock orchestrator

use std::time::Duration;

use thiserror::Error;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("provision error: {0}")]
    Provision(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("stream transport error: {0}")]
    Transport(String),

    #[error("deadline exceeded after {0:?}")]
    Deadline(Duration),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for OrchestratorError {
    fn from(err: anyhow::Error) -> Self {
        OrchestratorError::Internal(err.to_string())
    }
}
