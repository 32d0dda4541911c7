//! Wire types for the botdock deploy stream
//!
//! Shared between the orchestrator (which produces the record stream) and
//! the bridge (which consumes it on behalf of a browser client).

pub mod ndjson;

use serde::{Deserialize, Serialize};

/// Request to deploy and run one bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    /// Opaque identifier of the workload, unique per bot
    pub bot_id: String,

    /// Source repository URL
    pub git_repo: String,

    /// Branch or tag to deploy
    pub version: String,
}

/// Severity tag of a single log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogStatus {
    Info,
    Success,
    Error,
}

/// One unit of streamed deployment output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogResponse {
    /// Sanitized text line
    pub line: String,

    /// Severity tag
    pub status: LogStatus,
}

impl LogResponse {
    pub fn info(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            status: LogStatus::Info,
        }
    }

    pub fn success(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            status: LogStatus::Success,
        }
    }

    pub fn error(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            status: LogStatus::Error,
        }
    }
}

/// Wire-level error
#[derive(thiserror::Error, Debug)]
pub enum WireError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
