//! Execution-scoped context errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    /// An activity stub was called with no workflow execution active on this task.
    #[error("Context not set - activity stubs can only be invoked from workflow functions")]
    NotSet,
}
