//! Activity execution errors.

use thiserror::Error;

use super::store::StoreError;
use super::transport::TransportError;

/// Errors raised out of an activity handler.
///
/// An `Err` here fails the task handle outright. Activities that want the
/// workflow to keep its siblings running return an error marker value instead.
#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("Malformed activity input: {0}")]
    MalformedInput(#[from] TransportError),

    #[error("State store operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("Activity failed: {0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_error_malformed_input() {
        let err: ActivityError = TransportError::MalformedInput("no content".to_string()).into();
        assert!(err.to_string().contains("Malformed activity input"));
    }

    #[test]
    fn test_activity_error_failed() {
        let err = ActivityError::Failed("boom".to_string());
        assert!(err.to_string().contains("boom"));
    }
}
