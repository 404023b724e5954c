//! Workflow execution errors.

use thiserror::Error;

use super::context::ContextError;
use super::transport::TransportError;

/// Errors raised out of a workflow body.
///
/// These propagate to the engine, which marks the run failed. Per-action
/// errors are never represented here - they travel as values through the
/// task handles so sibling actions keep running.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    MalformedInput(#[from] TransportError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Failed to persist processing result: {0}")]
    Persistence(String),

    #[error("Activity call failed: {0}")]
    ActivityFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workflow_error_from_transport() {
        let err: WorkflowError = TransportError::MalformedInput("bad shape".to_string()).into();
        assert!(err.to_string().contains("Malformed input"));
    }

    #[test]
    fn test_workflow_error_from_context() {
        let err: WorkflowError = ContextError::NotSet.into();
        assert!(err.to_string().contains("Context not set"));
    }

    #[test]
    fn test_workflow_error_persistence() {
        let err = WorkflowError::Persistence("disk full".to_string());
        assert!(err.to_string().contains("persist"));
        assert!(err.to_string().contains("disk full"));
    }
}
