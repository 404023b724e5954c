//! Local engine errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Workflow not found: {0}")]
    UnknownWorkflow(String),

    #[error("Instance not found: {0}")]
    UnknownInstance(String),

    #[error("Replay diverged from recorded history: {0}")]
    ReplayMismatch(String),

    #[error("Workflow failed: {0}")]
    WorkflowFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_unknown_workflow() {
        let err = EngineError::UnknownWorkflow("processing_workflow".to_string());
        assert!(err.to_string().contains("Workflow not found"));
    }

    #[test]
    fn test_engine_error_replay_mismatch() {
        let err = EngineError::ReplayMismatch("call 2 differs".to_string());
        assert!(err.to_string().contains("diverged"));
        assert!(err.to_string().contains("call 2"));
    }
}
