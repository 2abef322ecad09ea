//! Error types for run orchestration

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::run::{RunId, RunStatus};

/// Errors surfaced by the run orchestration core
#[derive(Error, Debug)]
pub enum AcpError {
    /// No agent registered under this name
    #[error("Agent {0} not found")]
    AgentNotFound(String),

    /// No run with this identifier is retained
    #[error("Run {0} not found")]
    RunNotFound(RunId),

    /// The operation is not valid for the run's current status
    #[error("Run {run_id} is {status}, {operation} is not allowed")]
    InvalidState {
        run_id: RunId,
        status: RunStatus,
        operation: &'static str,
    },

    /// The operation is refused at the protocol boundary
    #[error("{0}")]
    Forbidden(String),

    /// The agent handler raised during execution
    #[error("Handler error: {0}")]
    Handler(String),

    /// Cancellation was requested; used to unwind the handler
    #[error("Run cancelled")]
    Cancelled,

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    ChannelClosed,

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AcpError {
    /// Create an invalid-state error
    pub fn invalid_state(run_id: RunId, status: RunStatus, operation: &'static str) -> Self {
        AcpError::InvalidState {
            run_id,
            status,
            operation,
        }
    }

    /// Create a handler error from any displayable failure
    pub fn handler(msg: impl Into<String>) -> Self {
        AcpError::Handler(msg.into())
    }

    /// Stable wire code for this error
    pub fn code(&self) -> &'static str {
        match self {
            AcpError::AgentNotFound(_) | AcpError::RunNotFound(_) => "not_found",
            AcpError::InvalidState { .. } | AcpError::InvalidConfig(_) => "invalid_input",
            AcpError::Forbidden(_) => "forbidden",
            AcpError::Handler(_)
            | AcpError::Cancelled
            | AcpError::ChannelClosed
            | AcpError::Serialization(_) => "server_error",
        }
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AcpError::AgentNotFound(_) | AcpError::RunNotFound(_))
    }

    /// Convert into the wire error model
    pub fn to_model(&self) -> ErrorModel {
        ErrorModel::new(self.code(), self.to_string())
    }
}

/// Result type alias for run orchestration operations
pub type AcpResult<T> = Result<T, AcpError>;

/// Wire-stable error shape carried by failed runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorModel {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ErrorModel {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    /// Error model for a failure raised by an agent handler
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new("server_error", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AcpError::AgentNotFound("echo".into());
        assert_eq!(err.to_string(), "Agent echo not found");

        let err = AcpError::ChannelClosed;
        assert_eq!(err.to_string(), "Channel closed");
    }

    #[test]
    fn test_error_codes() {
        let run_id = RunId::new();
        assert_eq!(AcpError::RunNotFound(run_id).code(), "not_found");
        assert_eq!(
            AcpError::invalid_state(run_id, RunStatus::Completed, "resume").code(),
            "invalid_input"
        );
        assert_eq!(AcpError::Forbidden("no".into()).code(), "forbidden");
        assert_eq!(AcpError::handler("boom").code(), "server_error");
        assert!(AcpError::RunNotFound(run_id).is_not_found());
        assert!(!AcpError::Cancelled.is_not_found());
    }

    #[test]
    fn test_invalid_state_message() {
        let run_id = RunId::new();
        let err = AcpError::invalid_state(run_id, RunStatus::Failed, "cancel");
        assert_eq!(
            err.to_string(),
            format!("Run {} is failed, cancel is not allowed", run_id)
        );
    }

    #[test]
    fn test_error_model_serialization() {
        let model = AcpError::handler("Whoops").to_model();
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["code"], "server_error");
        assert_eq!(json["message"], "Handler error: Whoops");
        assert!(json.get("data").is_none());
    }
}
