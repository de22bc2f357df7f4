use crate::traits::ToolErrorKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Decide,
    Execute,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decide => f.write_str("decide"),
            Self::Execute => f.write_str("execute"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),
    #[error("Tool '{0}' not found")]
    ToolNotFound(String),
    #[error("Invalid arguments for '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },
    #[error("Tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("{phase} phase timed out after {}s", .after.as_secs_f64())]
    Timeout { phase: Phase, after: Duration },
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("Invalid tool name '{0}': use lowercase letters, digits and '_'")]
    InvalidToolName(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Tag under which a tool-side error is folded into a tool-result message.
    /// `None` for errors that are fatal to a run.
    pub fn tool_error_kind(&self) -> Option<ToolErrorKind> {
        match self {
            Self::ToolNotFound(_) => Some(ToolErrorKind::NotFound),
            Self::InvalidArguments { .. } => Some(ToolErrorKind::InvalidArguments),
            Self::ToolExecution { .. } => Some(ToolErrorKind::Execution),
            Self::Validation(_) => Some(ToolErrorKind::Validation),
            Self::Timeout { .. } => Some(ToolErrorKind::Timeout),
            Self::ModelInvocation(_)
            | Self::DuplicateTool(_)
            | Self::InvalidToolName(_)
            | Self::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_side_errors_have_kinds() {
        assert_eq!(
            AgentError::ToolNotFound("x".into()).tool_error_kind(),
            Some(ToolErrorKind::NotFound)
        );
        let timeout = AgentError::Timeout {
            phase: Phase::Execute,
            after: Duration::from_millis(1500),
        };
        assert_eq!(timeout.tool_error_kind(), Some(ToolErrorKind::Timeout));
        assert_eq!(timeout.to_string(), "execute phase timed out after 1.5s");
    }

    #[test]
    fn model_errors_are_fatal() {
        assert!(
            AgentError::ModelInvocation("quota".into())
                .tool_error_kind()
                .is_none()
        );
    }
}
